//! Validation helpers for DTOs.

use validator::ValidationError;

/// Number of colour cells in a team logo grid.
pub const LOGO_CELLS: usize = 12;

/// Rejects names that are empty once trimmed or longer than 50 characters.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("team_name_required");
        err.message = Some("Team name is required".into());
        return Err(err);
    }

    if trimmed.chars().count() > 50 {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some("Team name must be 50 characters or less".into());
        return Err(err);
    }

    Ok(())
}

/// Logo data must be a JSON array with exactly [`LOGO_CELLS`] entries.
///
/// # Examples
///
/// ```ignore
/// validate_logo_data(r##"["#fff","#000",...]"##) // Ok with 12 entries
/// validate_logo_data("[]")                        // Err - wrong length
/// validate_logo_data("not json")                  // Err - not an array
/// ```
pub fn validate_logo_data(raw: &str) -> Result<(), ValidationError> {
    match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(cells) if cells.len() == LOGO_CELLS => Ok(()),
        Ok(cells) => {
            let mut err = ValidationError::new("logo_data_format");
            err.message = Some(
                format!("Logo must have {LOGO_CELLS} cells (got {})", cells.len()).into(),
            );
            Err(err)
        }
        Err(_) => {
            let mut err = ValidationError::new("logo_data_invalid");
            err.message = Some("Invalid logo data".into());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_name_bounds() {
        assert!(validate_team_name("Ground Pounders").is_ok());
        assert!(validate_team_name(&"x".repeat(50)).is_ok());
        assert!(validate_team_name(&"x".repeat(51)).is_err());
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name("").is_err());
    }

    #[test]
    fn team_name_is_measured_after_trim() {
        let padded = format!("  {}  ", "x".repeat(50));
        assert!(validate_team_name(&padded).is_ok());
    }

    #[test]
    fn logo_data_needs_twelve_cells() {
        let twelve = serde_json::to_string(&vec!["#112233"; 12]).unwrap();
        assert!(validate_logo_data(&twelve).is_ok());

        let eleven = serde_json::to_string(&vec!["#112233"; 11]).unwrap();
        assert!(validate_logo_data(&eleven).is_err());
        assert!(validate_logo_data("{\"a\":1}").is_err());
        assert!(validate_logo_data("nope").is_err());
    }
}
