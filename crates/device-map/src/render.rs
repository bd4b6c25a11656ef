use crate::device::DisplayRecord;
use crate::dom::{el, Element, Fragment, Node};

/// Properties shown outside the table.
const SPECIAL_PROPERTIES: [&str; 2] = ["id", "other"];

/// Build the popup body for one device: heading, property table, notes.
pub fn render_device_info(record: &DisplayRecord) -> Fragment {
    let mut result = Fragment::new();

    let mut heading = el(
        "h2.device-name",
        [format!("Device: {}", record.display("name"))],
    );
    heading.set_data("id", &record.display("id"));
    result.push(heading);

    let rows: Vec<Element> = record
        .properties()
        .filter(|(key, _)| !SPECIAL_PROPERTIES.contains(key))
        .map(|(key, value)| {
            el(
                "tr.device-property",
                [
                    el("th.name", [humanize_key(key)]),
                    el("td.value", [value.to_string()]),
                ],
            )
        })
        .collect();
    result.push(el("table.device-property-list", rows));

    result.push(el(
        "p.device-notes",
        [el("em", [Node::Text(record.display("other"))])],
    ));

    result
}

/// `battery_level` -> `Battery Level`.
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                // Leading, trailing or doubled `_` leaves an empty word.
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
