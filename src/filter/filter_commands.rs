use log::{info, warn};
use std::sync::Arc;

use crate::filter::SpamFilter;
use crate::types::FilterError;

/// Longest reply before lists get cut short
const MAX_REPLY_ITEMS: usize = 50;

/// Admin text commands (`/add_word`, `/char_map`, ...) over a shared filter.
///
/// Authorization is the caller's job: every line handed in here is trusted.
pub struct FilterCommands {
    filter: Arc<SpamFilter>,
}

impl FilterCommands {
    pub fn new(filter: Arc<SpamFilter>) -> Self {
        Self { filter }
    }

    /// Run one command line. `None` means the line was not a filter command.
    pub fn process_command(&self, line: &str) -> Option<String> {
        let line = line.trim();
        let body = line.strip_prefix('/')?;
        let (command, rest) = match body.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (body, ""),
        };

        let response = match command.to_lowercase().as_str() {
            "add_word" => self.handle_add_word(rest),
            "remove_word" => self.handle_remove_word(rest),
            "list_words" => self.handle_list_words(),
            "add_char" => self.handle_add_char(rest),
            "remove_char" => self.handle_remove_char(rest),
            "char_map" => self.handle_char_map(),
            "check" => self.handle_check(rest),
            "stats" => self.handle_stats(),
            "help" => Self::help(),
            _ => return None,
        };

        info!("Filter command '/{}' handled", command);
        Some(response)
    }

    fn help() -> String {
        "🛡️ Filter Commands: /add_word <pattern> | /remove_word <pattern> | /list_words | \
         /add_char <canonical> <alternate> | /remove_char <canonical> <alternate> | /char_map | \
         /check <message> | /stats"
            .to_string()
    }

    fn handle_add_word(&self, pattern: &str) -> String {
        if pattern.is_empty() {
            return "Usage: /add_word <pattern>".to_string();
        }

        match self.filter.add_pattern(pattern) {
            Ok(()) => format!("✅ Pattern '{}' added", pattern),
            Err(FilterError::MalformedPattern { pattern, source }) => {
                warn!("Rejected pattern '{}': {}", pattern, source);
                format!("❌ Invalid regex '{}': {}", pattern, source)
            }
            Err(e) => format!("❌ {}", e),
        }
    }

    fn handle_remove_word(&self, pattern: &str) -> String {
        if pattern.is_empty() {
            return "Usage: /remove_word <pattern>".to_string();
        }

        match self.filter.remove_pattern(pattern) {
            Ok(()) => format!("🗑️ Pattern '{}' removed", pattern),
            Err(FilterError::UnknownEntry(_)) => format!("❌ Pattern '{}' not found", pattern),
            Err(e) => format!("❌ {}", e),
        }
    }

    fn handle_list_words(&self) -> String {
        let patterns = self.filter.patterns();
        if patterns.is_empty() {
            return "📋 No patterns configured".to_string();
        }

        let shown: Vec<&str> = patterns
            .iter()
            .take(MAX_REPLY_ITEMS)
            .map(String::as_str)
            .collect();
        let mut response = format!("📋 Patterns ({}): {}", patterns.len(), shown.join(", "));
        if patterns.len() > MAX_REPLY_ITEMS {
            response.push_str(&format!(" ... and {} more", patterns.len() - MAX_REPLY_ITEMS));
        }
        response
    }

    fn handle_add_char(&self, args: &str) -> String {
        let (canonical, alternate) = match Self::mapping_args(args) {
            Some(pair) => pair,
            None => return "Usage: /add_char <canonical> <alternate>".to_string(),
        };

        match self.filter.add_char_mapping(canonical, alternate) {
            Ok(()) => format!("✅ '{}' now reads as '{}'", alternate, canonical),
            Err(FilterError::DuplicateEntry { .. }) => {
                format!("⚠️ '{}' is already mapped to '{}'", alternate, canonical)
            }
            Err(e) => format!("❌ {}", e),
        }
    }

    fn handle_remove_char(&self, args: &str) -> String {
        let (canonical, alternate) = match Self::mapping_args(args) {
            Some(pair) => pair,
            None => return "Usage: /remove_char <canonical> <alternate>".to_string(),
        };

        match self.filter.remove_char_mapping(canonical, alternate) {
            Ok(()) => format!("🗑️ '{}' no longer reads as '{}'", alternate, canonical),
            Err(FilterError::UnknownEntry(_)) => {
                format!("❌ No mapping '{}' -> '{}'", alternate, canonical)
            }
            Err(e) => format!("❌ {}", e),
        }
    }

    fn handle_char_map(&self) -> String {
        let table = self.filter.char_map();
        if table.is_empty() {
            return "🔤 Character map is empty".to_string();
        }

        let entries: Vec<String> = table
            .iter()
            .take(MAX_REPLY_ITEMS)
            .map(|(canonical, alternates)| format!("{}: {}", canonical, alternates.join(" ")))
            .collect();
        let mut response = format!("🔤 Character map ({}): {}", table.len(), entries.join(" | "));
        if table.len() > MAX_REPLY_ITEMS {
            response.push_str(&format!(" ... and {} more", table.len() - MAX_REPLY_ITEMS));
        }
        response
    }

    fn handle_check(&self, message: &str) -> String {
        if message.is_empty() {
            return "Usage: /check <message>".to_string();
        }

        let verdict = self.filter.check(message);
        if verdict.is_spam {
            format!(
                "🚫 Spam. Normalized: '{}'. Matched: {}",
                verdict.normalized,
                verdict.matched_patterns.join(", ")
            )
        } else {
            format!(
                "✅ Clean. Normalized: '{}' ({} variants checked)",
                verdict.normalized,
                verdict.candidates.len()
            )
        }
    }

    fn handle_stats(&self) -> String {
        let stats = self.filter.stats();
        format!(
            "📊 Filter Stats: {} patterns | {} canonical forms | {} alternates ({} ambiguous) | matcher {} | built {}",
            stats.patterns,
            stats.canonical_forms,
            stats.alternates,
            stats.ambiguous_alternates,
            if stats.matcher_active { "active" } else { "idle" },
            stats.built_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    /// `<canonical> <alternate>`; the alternate may not contain spaces
    fn mapping_args(args: &str) -> Option<(&str, &str)> {
        let mut parts = args.split_whitespace();
        let canonical = parts.next()?;
        let alternate = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some((canonical, alternate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands() -> FilterCommands {
        FilterCommands::new(Arc::new(SpamFilter::in_memory()))
    }

    #[test]
    fn test_non_commands_ignored() {
        let commands = commands();
        assert!(commands.process_command("hello there").is_none());
        assert!(commands.process_command("/unknown thing").is_none());
    }

    #[test]
    fn test_word_commands() {
        let commands = commands();

        let response = commands.process_command("/add_word рубл(ь|я|ей)").unwrap();
        assert!(response.starts_with("✅"));

        let response = commands.process_command("/list_words").unwrap();
        assert!(response.contains("рубл(ь|я|ей)"));

        let response = commands.process_command("/check 100 pyблей").unwrap();
        assert!(response.starts_with("🚫"));

        let response = commands.process_command("/remove_word рубл(ь|я|ей)").unwrap();
        assert!(response.starts_with("🗑️"));

        let response = commands.process_command("/remove_word рубл(ь|я|ей)").unwrap();
        assert!(response.contains("not found"));

        let response = commands.process_command("/list_words").unwrap();
        assert!(response.contains("No patterns"));
    }

    #[test]
    fn test_patterns_may_contain_spaces() {
        let commands = commands();
        commands.process_command("/add_word  заработок в сети ").unwrap();
        assert_eq!(commands.filter.patterns(), vec!["заработок в сети".to_string()]);
    }

    #[test]
    fn test_invalid_regex_reported() {
        let commands = commands();
        let response = commands.process_command("/add_word руб(").unwrap();
        assert!(response.starts_with("❌ Invalid regex"));
        assert!(commands.filter.patterns().is_empty());
    }

    #[test]
    fn test_usage_messages() {
        let commands = commands();
        assert!(commands.process_command("/add_word").unwrap().starts_with("Usage"));
        assert!(commands.process_command("/add_char ї").unwrap().starts_with("Usage"));
        assert!(commands.process_command("/remove_char a b c").unwrap().starts_with("Usage"));
        assert!(commands.process_command("/check   ").unwrap().starts_with("Usage"));
    }

    #[test]
    fn test_char_commands() {
        let commands = commands();

        let response = commands.process_command("/add_char ї ji").unwrap();
        assert!(response.starts_with("✅"));
        assert!(commands.process_command("/add_char ї ji").unwrap().starts_with("⚠️"));
        assert!(commands.process_command("/char_map").unwrap().contains("ї: yi ji"));

        assert!(commands.process_command("/remove_char ї ji").unwrap().starts_with("🗑️"));
        assert!(commands.process_command("/remove_char ї ji").unwrap().starts_with("❌"));
    }

    #[test]
    fn test_stats_and_clean_check() {
        let commands = commands();
        let response = commands.process_command("/check добрый вечер").unwrap();
        assert!(response.starts_with("✅ Clean"));

        let response = commands.process_command("/STATS").unwrap();
        assert!(response.contains("0 patterns"));
        assert!(response.contains("matcher idle"));
    }
}
