use super::*;

#[test]
fn push_appends_and_replace_swaps_current_entry() {
    let navigator = HistoryNavigator::new();
    navigator.navigate("/elder", NavigateOptions::default());
    navigator.navigate("/profile", NavigateOptions::default());
    navigator.navigate("/login", NavigateOptions { replace: true });

    assert_eq!(navigator.history(), vec!["/elder".to_owned(), "/login".to_owned()]);
    assert_eq!(navigator.current().as_deref(), Some("/login"));
}

#[test]
fn replace_on_empty_history_records_the_path() {
    let navigator = HistoryNavigator::new();
    assert_eq!(navigator.current(), None);
    navigator.navigate("/login", NavigateOptions { replace: true });
    assert_eq!(navigator.history(), vec!["/login".to_owned()]);
}
