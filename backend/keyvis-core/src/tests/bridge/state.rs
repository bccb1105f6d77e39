use crate::bridge::PermissionTransition;

/// **VALUE**: Verifies transition detection for every previous/current pair.
///
/// **WHY THIS MATTERS**: Transition logging and the workload change feed are keyed on it.
///
/// **BUG THIS CATCHES**: Would catch an unchanged write being reported as a transition.
#[test]
fn given_each_value_pair_when_classified_then_only_changes_are_transitions() {
    assert_eq!(
        PermissionTransition::between(false, true),
        Some(PermissionTransition::Granted)
    );
    assert_eq!(
        PermissionTransition::between(true, false),
        Some(PermissionTransition::Revoked)
    );
    assert_eq!(PermissionTransition::between(true, true), None);
    assert_eq!(PermissionTransition::between(false, false), None);
}
