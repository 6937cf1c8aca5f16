use lockstep::edit::{EditableRecord, FieldLens};

#[derive(Clone, lockstep::edit::EditableRecord)]
struct Item {
    #[edit(key = "name")]
    item_name: String,
    price: u32,
    unit_price_cents: u64,
}

fn main() {
    let fields = Item::fields();
    assert_eq!(fields.item_name().key().as_str(), "name");
    assert_eq!(fields.price().key().as_str(), "price");
    let _: ItemPriceLens = fields.price();

    let mut item = Item {
        item_name: "Widget".to_string(),
        price: 1250,
        unit_price_cents: 0,
    };
    let cents: ItemUnitPriceCentsLens = fields.unit_price_cents();
    cents.set(&mut item, 99);
    assert_eq!(*cents.get(&item), 99);
    assert_eq!(cents.key().as_str(), "unit_price_cents");
}
