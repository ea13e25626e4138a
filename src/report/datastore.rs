use anyhow::Result;
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

use super::ResultProjector;
use crate::portfolio::{Valuation, ValuationLine};

pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

/// Page and database property patches for a table-style datastore.
///
/// One patch per asset (unit price plus a status select), then a patch that
/// stamps the database title with the run time. The patches are not sent.
pub struct DatastoreProjector {
    timezone: Tz,
}

impl DatastoreProjector {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    fn line_patch(line: &ValuationLine) -> Value {
        let unit_price = line.unit_price.and_then(|p| p.to_f64());
        let status = if line.has_error { STATUS_ERROR } else { STATUS_OK };
        json!({
            "name": line.name,
            "properties": {
                "unit_price": { "number": unit_price },
                "status": { "select": { "name": status } }
            }
        })
    }
}

impl ResultProjector for DatastoreProjector {
    fn render(&self, valuation: &Valuation) -> Result<String> {
        let stamp = valuation.as_of.with_timezone(&self.timezone);
        let mut patches: Vec<Value> = valuation.lines.iter().map(Self::line_patch).collect();
        patches.push(json!({
            "title": format!("Assets [{}]", stamp.format("%y/%m/%d %H:%M:%S"))
        }));
        Ok(serde_json::to_string_pretty(&patches)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn one_patch_per_line_plus_title() -> Result<()> {
        let projector = DatastoreProjector::new(chrono_tz::Asia::Tokyo);
        let rendered = projector.render(&fixtures::valuation(true))?;
        let patches: Vec<Value> = serde_json::from_str(&rendered)?;

        assert_eq!(patches.len(), 3);
        assert_eq!(patches[0]["name"], "A");
        assert_eq!(patches[0]["properties"]["unit_price"]["number"], 4500000.0);
        assert_eq!(patches[0]["properties"]["status"]["select"]["name"], STATUS_OK);

        assert_eq!(patches[1]["name"], "B");
        assert_eq!(patches[1]["properties"]["unit_price"]["number"], Value::Null);
        assert_eq!(patches[1]["properties"]["status"]["select"]["name"], STATUS_ERROR);

        assert_eq!(patches[2]["title"], "Assets [24/06/03 18:00:00]");
        Ok(())
    }
}
