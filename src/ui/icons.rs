//! Shared UI icons and emojis.
//!
//! This module provides common emoji constants used across the console
//! output for consistent visual styling.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");

// Stage indicators
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static PARSE: Emoji<'_, '_> = Emoji("📝 ", "[PARSE]");
pub static CYCLE: Emoji<'_, '_> = Emoji("🔄 ", "[SORT]");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "[DIST]");
pub static WRITE: Emoji<'_, '_> = Emoji("✍️  ", "[WRITE]");

// Data movement indicators
pub static EXPORT: Emoji<'_, '_> = Emoji("📤 ", "[EXPORT]");
pub static IMPORT: Emoji<'_, '_> = Emoji("📥 ", "[IMPORT]");
pub static PROBE: Emoji<'_, '_> = Emoji("🔌 ", "[PING]");
pub static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[SCAN]");
