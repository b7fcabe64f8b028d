// Exit code registry - single source of truth for CLI exit codes

pub const EXIT_INVALID_CONFIG: u8 = 3;
pub const EXIT_IO: u8 = 4;
