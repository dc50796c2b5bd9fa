//! Assertion helpers for flow outcomes

use crate::flow::{FlowView, SubmitOutcome};
use crate::models::BannerMessage;
use crate::utils::navigation::NavigationAction;

/// Assert that a submit navigated, returning the action
///
/// # Panics
///
/// Panics if the outcome is anything but a navigation.
pub fn assert_navigated(outcome: &SubmitOutcome) -> &NavigationAction {
    match outcome {
        SubmitOutcome::Navigated(action) => action,
        other => panic!("Expected a navigation, got {other:?}"),
    }
}

/// Assert a full page load of `target`
///
/// # Panics
///
/// Panics if the action is soft or points elsewhere.
pub fn assert_hard_navigation(action: &NavigationAction, target: &str) {
    assert!(action.is_hard(), "Expected hard navigation, got {action:?}");
    assert_eq!(action.target(), target);
}

/// Assert an in-app navigation to `target` that replaces the history entry
///
/// # Panics
///
/// Panics if the action is hard, does not replace, or points elsewhere.
pub fn assert_soft_replace(action: &NavigationAction, target: &str) {
    match action {
        NavigationAction::Soft {
            target: actual,
            replace,
            ..
        } => {
            assert!(*replace, "Expected a history-replacing navigation");
            assert_eq!(actual, target);
        }
        NavigationAction::Hard { .. } => panic!("Expected soft navigation, got {action:?}"),
    }
}

/// Assert that a submit left the form up with a banner, returning it
///
/// # Panics
///
/// Panics if the outcome carries no banner.
pub fn assert_banner(outcome: &SubmitOutcome) -> &BannerMessage {
    match outcome {
        SubmitOutcome::Banner(banner) => banner,
        other => panic!("Expected a banner, got {other:?}"),
    }
}

/// Assert that the form is showing, returning its banner
///
/// # Panics
///
/// Panics if the view is not the submission form.
pub fn assert_form_shown(view: &FlowView) -> Option<&BannerMessage> {
    match view {
        FlowView::SubmissionForm { banner } => banner.as_ref(),
        other => panic!("Expected the submission form, got {other:?}"),
    }
}
