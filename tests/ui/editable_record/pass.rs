use lockstep::edit::{EditableRecord, FieldLens};

#[derive(Clone, lockstep::edit::EditableRecord)]
struct Item {
    display_name: String,
}

fn main() {
    let fields = Item::fields();
    let lens = fields.display_name();
    let mut record = Item {
        display_name: "Widget".to_string(),
    };
    lens.set(&mut record, "Widget v2".to_string());
    assert_eq!(lens.key().as_str(), "display_name");
    assert_eq!(lens.get(&record), "Widget v2");
}
