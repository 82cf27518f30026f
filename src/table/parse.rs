//! Header line parsing for existing documents

use super::types::Header;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to parse header line: {0}")]
    Csv(csv::Error),
    #[error("header line is empty")]
    EmptyHeader,
    #[error("header line has an unterminated quote")]
    UnterminatedQuote,
}

/// Parse the first line of `content` as a header row.
///
/// Only the text up to the first `\n` is read. A trailing `\r` and a leading
/// byte order mark are not part of the header. Quoted cells may contain the
/// delimiter.
pub fn header_line(content: &str, delimiter: u8) -> Result<Header, ParseError> {
    let line = content.split_once('\n').map_or(content, |(line, _)| line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    let line = line.strip_prefix('\u{feff}').unwrap_or(line);
    // escaped quotes come in pairs, so an odd count leaves a quoted cell open
    if line.bytes().filter(|&byte| byte == b'"').count() % 2 != 0 {
        return Err(ParseError::UnterminatedQuote);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record).map_err(ParseError::Csv)? {
        return Err(ParseError::EmptyHeader);
    }
    Ok(record.iter().collect())
}
