use serde_json::json;

use crate::cli::{connect_store, utils::output_success, OutputFormat};
use crate::services::billing::init_plans;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let store = connect_store().await?;
    let plans = init_plans(&store).await?;

    if let OutputFormat::Text = output_format {
        for (plan, created) in &plans {
            let action = if *created { "created" } else { "exists " };
            println!("  {} {} (R$ {}/month)", action, plan.name, plan.monthly_price);
        }
    }

    let created = plans.iter().filter(|(_, c)| *c).count();
    let data = json!({
        "plans": plans
            .iter()
            .map(|(plan, created)| json!({ "name": plan.name, "monthly_price": plan.monthly_price, "created": created }))
            .collect::<Vec<_>>()
    });
    let message = format!("{} plan(s) created, {} already present", created, plans.len() - created);
    output_success(&output_format, &message, Some(data))
}
