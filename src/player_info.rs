use crate::error::InputRejection;

pub const MAX_NAME_CHARS: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub name: String,
    pub email: String,
}

pub fn validate_player_info(name: &str, email: &str) -> Result<PlayerIdentity, InputRejection> {
    let name = sanitize_name(name);
    let email = email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(InputRejection::MissingField);
    }
    if !is_valid_email(email) {
        return Err(InputRejection::InvalidEmail);
    }
    Ok(PlayerIdentity {
        name,
        email: email.to_string(),
    })
}

pub fn sanitize_name(value: &str) -> String {
    value.trim().chars().take(MAX_NAME_CHARS).collect()
}

pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && !domain.starts_with('.') && !domain.contains("..")
}
