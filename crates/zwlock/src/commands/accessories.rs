//! `zwlock accessories`: list persisted accessory records.

use tabled::Tabled;
use zwlock_core::{AccessoryRecord, NodeId};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::host;
use crate::output::{self, or_dash};

#[derive(Tabled)]
struct AccessoryRow {
    #[tabled(rename = "Node")]
    node: NodeId,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "Beeper")]
    beeper: String,
    #[tabled(rename = "Vacation")]
    vacation: String,
    #[tabled(rename = "Config Updated")]
    config_updated: String,
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.into()
}

impl From<&AccessoryRecord> for AccessoryRow {
    fn from(r: &AccessoryRecord) -> Self {
        Self {
            node: r.node_id,
            name: r.display_name.clone(),
            state: r.lock_state.to_string(),
            target: r.target_state.to_string(),
            battery: or_dash(r.battery.map(|b| format!("{b}%"))),
            low: yes_no(r.low_battery()),
            beeper: yes_no(r.configuration.beeper),
            vacation: yes_no(r.configuration.vacation_mode),
            config_updated: if r.last_configuration_update == 0 {
                "-".into()
            } else {
                r.last_configuration_update.to_string()
            },
        }
    }
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let records = host::load_records(&config::storage_dir(global)?)?;
    let out = output::render_list(
        &global.output,
        &records,
        |r| AccessoryRow::from(r),
        |r| r.node_id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
