use crate::cli::{connect_store, utils::output_fields, OutputFormat};
use crate::config;
use crate::tenancy::resolver::{resolve, strip_port};

pub async fn handle(host: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let tenancy = &config::config().tenancy;
    let host = strip_port(host.trim()).to_ascii_lowercase();

    if tenancy.is_reserved(&host) {
        return output_fields(&output_format, &[("host", host), ("result", "reserved".to_string())]);
    }

    let store = connect_store().await?;
    match resolve(&store, tenancy, Some(host.as_str())).await {
        Some(property) => output_fields(
            &output_format,
            &[
                ("host", host),
                ("result", "resolved".to_string()),
                ("property_id", property.id.to_string()),
                ("name", property.name),
                ("slug", property.slug),
            ],
        ),
        None => output_fields(&output_format, &[("host", host), ("result", "unresolved".to_string())]),
    }
}
