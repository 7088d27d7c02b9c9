use std::process::ExitCode;

use anyhow::{Result, bail};
use console::style;
use taskgen::taxonomy::{SECTORS, find_sector};

pub fn run(sector: Option<&str>) -> Result<ExitCode> {
    if let Some(name) = sector {
        let Some(sector) = find_sector(name) else {
            bail!("Unknown sector: {name}");
        };
        for occupation in sector.occupations {
            println!("{occupation}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    for sector in SECTORS {
        println!(
            "{} {}",
            style(sector.name).bold(),
            style(format!("({} of GDP)", sector.gdp_share)).dim()
        );
        for occupation in sector.occupations {
            println!("  - {occupation}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
