use lsifkit_core::FactsDump;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let schema = schemars::schema_for!(FactsDump);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
