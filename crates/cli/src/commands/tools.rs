//! `discord-assist tools` — List the tools offered to the model.

use assist_core::provider::ToolDefinition;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = assist_tools::default_registry();
    let schemas: Vec<ToolDefinition> = registry.schemas().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    println!("🔧 Available tools ({}):", schemas.len());
    println!();
    for tool in &schemas {
        println!("  {}", tool.name);
        println!("      {}", tool.description);

        let required: Vec<&str> = tool.input_schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        if let Some(props) = tool.input_schema["properties"].as_object() {
            for (name, prop) in props {
                let kind = prop["type"].as_str().unwrap_or("any");
                let marker = if required.contains(&name.as_str()) { "*" } else { " " };
                let desc = prop["description"].as_str().unwrap_or_default();
                println!("      {marker} {name} ({kind}): {desc}");
            }
        }
        println!();
    }
    println!("  * = required");
    Ok(())
}
