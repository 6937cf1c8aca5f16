#[test]
fn editable_record_derive_ui() {
    let testcases = trybuild::TestCases::new();
    testcases.pass("tests/ui/editable_record/pass.rs");
    testcases.pass("tests/ui/editable_record/pass_key_override.rs");
}
