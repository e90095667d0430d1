pub mod bucket;
pub mod instance;
pub mod key;
pub mod subnet_group;

use cumulus_cloud::Action;

/// Past-tense verb for the success line.
pub(crate) fn done(action: Action) -> &'static str {
    match action {
        Action::Create => "created",
        Action::Read => "read",
        Action::Update => "updated",
        Action::Delete => "deleted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_verbs() {
        assert_eq!(done(Action::Create), "created");
        assert_eq!(done(Action::Read), "read");
        assert_eq!(done(Action::Update), "updated");
        assert_eq!(done(Action::Delete), "deleted");
    }
}
