pub mod convert;
pub mod srt;

pub use convert::convert_to_subtitles;
pub use srt::{
    format_millis, format_srt, format_timestamp, parse_srt, parse_timestamp, to_millis,
    write_subtitles,
};

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}
