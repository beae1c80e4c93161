use argtree::{ArgumentSettings, CommandParser, Nargs, Value};

fn main() {
    let parser = CommandParser::new("summer")
        .description("Sum the items.")
        .argument(
            "item",
            "The items to sum.",
            ArgumentSettings::new()
                .nargs(Nargs::AtLeastOne)
                .value_type("int"),
        );

    let namespace = parser.parse();
    let sum: i64 = namespace
        .get("item")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_int)
        .sum();
    println!("Sum: {sum}");
}
