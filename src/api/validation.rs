use thiserror::Error;

/// Most ids the YouTube API accepts in one listing call
pub const MAX_IDS: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdListError {
    #[error("id count must be between 1 and 50, got {0}")]
    Count(usize),
}

/// Splits a comma-separated id list, trimming and dropping empty entries
pub fn parse_id_list(raw: &str) -> Result<Vec<String>, IdListError> {
    let ids: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect();

    if !(1..=MAX_IDS).contains(&ids.len()) {
        return Err(IdListError::Count(ids.len()));
    }

    Ok(ids)
}
