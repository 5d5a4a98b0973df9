pub const APP_NAME: &str = "Operator Cost Scanner";
pub const APP_AUTHOR: &str = "SetScallywag";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

const USER_AGENT_NAME: &str = "operator-cost-scanner";

pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

/// Sent with every wiki request.
pub fn user_agent() -> String {
    format!("{}/{} (by {})", USER_AGENT_NAME, version_label(), APP_AUTHOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_version() {
        let agent = user_agent();
        assert!(agent.starts_with("operator-cost-scanner/"));
        assert!(agent.contains(&version_label()));
    }
}
