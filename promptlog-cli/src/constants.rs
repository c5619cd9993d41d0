pub const PROMPTLOG_CLI: &str = "promptlog";
