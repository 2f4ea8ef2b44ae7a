//! Shared building blocks used by every crate of the workspace:
//! logging initialisation and small response types.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn flash_appends_query_flag() {
        let f = types::Flash::Success("created".into());
        assert_eq!(f.redirect_target("/customers"), "/customers?success=created");
        let f = types::Flash::Error("unauthorized".into());
        assert_eq!(f.redirect_target("/dashboard?tab=1"), "/dashboard?tab=1&error=unauthorized");
    }
}
