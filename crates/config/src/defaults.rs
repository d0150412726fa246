pub fn default_enabled() -> bool {
    true
}

pub fn default_sheets_api_base_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

pub fn default_subscribers_table() -> String {
    "subscribers".to_string()
}

pub fn default_history_table() -> String {
    "history".to_string()
}

pub fn default_test_suffix() -> String {
    "_TEST".to_string()
}

pub fn default_request_timeout_seconds() -> u64 {
    30
}

pub fn default_tie_break() -> String {
    "ordered".to_string()
}

pub fn default_subject() -> String {
    "Coffee Time".to_string()
}

pub fn default_max_concurrent_sends() -> usize {
    5
}

pub fn default_send_timeout_seconds() -> u64 {
    30
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}
