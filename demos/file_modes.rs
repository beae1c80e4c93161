use argtree::{ArgumentSettings, CommandParser, OptionSettings, Value};

fn main() {
    let parser = CommandParser::new("file_modes")
        .description("Open a file in one of several modes.")
        .option(
            "-r",
            "Open for reading (the default).",
            OptionSettings::new()
                .dest("mode")
                .action("store_const")
                .constant("read")
                .default_value("read"),
        )
        .option(
            "-w",
            "Open for writing.",
            OptionSettings::new()
                .dest("mode")
                .action("store_const")
                .constant("write"),
        )
        .option(
            "-a",
            "Open for appending.",
            OptionSettings::new()
                .dest("mode")
                .action("store_const")
                .constant("append"),
        )
        .option(
            ["-v", "--verbose"],
            "Increase the verbosity (repeatable).",
            OptionSettings::new().action("count").default_value(0),
        )
        .option(
            ["-e", "--encoding"],
            "The text encoding.",
            OptionSettings::new()
                .value_type("choice")
                .choices(["utf-8", "ascii", "latin-1"])
                .default_value("utf-8"),
        )
        .argument(
            "path",
            "The file to open.",
            ArgumentSettings::new().required(true),
        )
        .addition("When multiple modes are given, the last one wins.");

    let namespace = parser.parse();
    let mode = namespace.get("mode").and_then(Value::as_str).unwrap_or("read");
    let encoding = namespace
        .get("encoding")
        .and_then(Value::as_str)
        .unwrap_or("utf-8");
    let path = namespace.get("path").and_then(Value::as_str).unwrap_or_default();

    if namespace.get("verbose").and_then(Value::as_int).unwrap_or_default() > 0 {
        println!("{namespace:?}");
    }

    println!("Opening '{path}' for {mode} ({encoding}).");
}
