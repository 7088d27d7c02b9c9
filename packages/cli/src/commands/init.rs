use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use common::filename::is_valid_task_name;
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use taskgen::draft::MIN_INSTRUCTION_CHARS;
use taskgen::rubric::{DEFAULT_POINTS, MAX_POINTS, MIN_RUBRIC_ITEMS};
use taskgen::taxonomy::SECTORS;
use taskgen::{Difficulty, RubricModel};

use crate::manifest::{RubricSpec, TaskManifest};
use crate::style::{print_error, print_header, print_info, print_success};

fn check_task_name(input: &str) -> Result<(), &'static str> {
    if is_valid_task_name(input.trim()) {
        Ok(())
    } else {
        Err("Use lowercase letters, digits and hyphens only")
    }
}

pub fn run(output: &Path) -> Result<ExitCode> {
    let theme = ColorfulTheme::default();

    if output.exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!("  {} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?
    {
        print_info("Cancelled");
        return Ok(ExitCode::SUCCESS);
    }

    print_header("Task");
    let name: String = Input::with_theme(&theme)
        .with_prompt("  Task name")
        .validate_with(|input: &String| check_task_name(input))
        .interact_text()?;

    let sector_labels: Vec<String> = SECTORS
        .iter()
        .map(|s| format!("{} ({})", s.name, s.gdp_share))
        .collect();
    let sector = &SECTORS[Select::with_theme(&theme)
        .with_prompt("  Sector")
        .items(&sector_labels)
        .default(0)
        .interact()?];
    let occupation = sector.occupations[Select::with_theme(&theme)
        .with_prompt("  Occupation")
        .items(sector.occupations)
        .default(0)
        .interact()?];

    let instruction: String = Input::with_theme(&theme)
        .with_prompt("  Instruction")
        .validate_with(|input: &String| -> Result<(), String> {
            let len = input.trim().chars().count();
            if len >= MIN_INSTRUCTION_CHARS {
                Ok(())
            } else {
                Err(format!(
                    "At least {MIN_INSTRUCTION_CHARS} characters required ({len} so far)"
                ))
            }
        })
        .interact_text()?;

    let difficulties = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
    let difficulty = difficulties[Select::with_theme(&theme)
        .with_prompt("  Difficulty")
        .items(&difficulties.map(|d| d.as_str()))
        .default(2)
        .interact()?];

    let expert_hours = prompt_hours(&theme, "  Expert hours", 1.0)?;
    let junior_hours = prompt_hours(&theme, "  Junior hours", expert_hours * 2.0)?;

    print_header("Rubric");
    let rubric = prompt_rubric(&theme)?;

    print_header("Files");
    print_info("Paths are stored as typed, relative to the manifest directory");
    let reference_files = prompt_paths(&theme, "  Reference file (empty to finish)")?;
    let solution_files = prompt_paths(&theme, "  Solution file (empty to finish)")?;
    if solution_files.is_empty() {
        print_error("No solution files yet; add some before generating");
    }

    let manifest = TaskManifest {
        name: name.trim().to_string(),
        sector: sector.name.to_string(),
        occupation: occupation.to_string(),
        instruction: instruction.trim().to_string(),
        difficulty,
        expert_hours,
        junior_hours,
        reference_files,
        solution_files,
        rubric,
        task_id: None,
    };
    manifest.save(output)?;

    println!();
    print_success(&format!("Wrote {}", style(output.display()).cyan()));
    print_info(&format!("Next: taskgen preview {}", output.display()));
    Ok(ExitCode::SUCCESS)
}

fn prompt_hours(theme: &ColorfulTheme, prompt: &str, default: f64) -> Result<f64> {
    let hours: f64 = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .validate_with(|h: &f64| -> Result<(), &str> {
            if h.is_finite() && *h >= 0.0 {
                Ok(())
            } else {
                Err("Enter a non-negative number of hours")
            }
        })
        .interact_text()?;
    Ok(hours)
}

fn prompt_rubric_item(theme: &ColorfulTheme, index: usize) -> Result<RubricSpec> {
    let name: String = Input::with_theme(theme)
        .with_prompt(format!("  Category {index} name"))
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let description: String = Input::with_theme(theme)
        .with_prompt(format!("  Category {index} description"))
        .allow_empty(true)
        .interact_text()?;
    let points: u32 = Input::with_theme(theme)
        .with_prompt(format!("  Category {index} points"))
        .default(DEFAULT_POINTS)
        .validate_with(|p: &u32| -> Result<(), String> {
            if (1..=MAX_POINTS).contains(p) {
                Ok(())
            } else {
                Err(format!("Points must be between 1 and {MAX_POINTS}"))
            }
        })
        .interact_text()?;
    Ok(RubricSpec {
        name: name.trim().to_string(),
        description: description.trim().to_string(),
        points: i64::from(points),
    })
}

/// Collect at least the minimum number of categories, then offer add/remove
/// until the author is done. Removal below the floor is refused.
fn prompt_rubric(theme: &ColorfulTheme) -> Result<Vec<RubricSpec>> {
    let mut items = Vec::new();
    for i in 1..=MIN_RUBRIC_ITEMS {
        items.push(prompt_rubric_item(theme, i)?);
    }

    loop {
        let total: i64 = items.iter().map(|r| r.points).sum();
        print_info(&format!("{} categories, {total} points", items.len()));
        let choice = Select::with_theme(theme)
            .with_prompt("  Rubric")
            .items(&["Done", "Add category", "Remove category"])
            .default(0)
            .interact()?;
        match choice {
            1 => items.push(prompt_rubric_item(theme, items.len() + 1)?),
            2 => {
                let labels: Vec<String> = items
                    .iter()
                    .map(|r| format!("{} ({} points)", r.name, r.points))
                    .collect();
                let idx = Select::with_theme(theme)
                    .with_prompt("  Remove which?")
                    .items(&labels)
                    .interact()?;
                if let Err(e) = remove_respecting_floor(&mut items, idx) {
                    print_error(&e);
                }
            }
            _ => return Ok(items),
        }
    }
}

fn remove_respecting_floor(items: &mut Vec<RubricSpec>, idx: usize) -> Result<(), String> {
    let mut model = RubricModel::from_items(
        items
            .iter()
            .map(|r| taskgen::RubricItem::new(&r.name, &r.description, r.points)),
    );
    let id = model.ids().get(idx).copied().ok_or("No such category")?;
    model.remove_item(id).map_err(|e| e.to_string())?;
    items.remove(idx);
    Ok(())
}

fn prompt_paths(theme: &ColorfulTheme, prompt: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    loop {
        let input: String = Input::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        let input = input.trim();
        if input.is_empty() {
            return Ok(paths);
        }
        paths.push(PathBuf::from(input));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> RubricSpec {
        RubricSpec {
            name: name.into(),
            description: String::new(),
            points: 10,
        }
    }

    #[test]
    fn task_name_prompt_rules() {
        assert_eq!(check_task_name("sample-task-2"), Ok(()));
        assert_eq!(check_task_name("  padded-name "), Ok(()));
        assert!(check_task_name("Sample").is_err());
        assert!(check_task_name("sample_task").is_err());
        assert!(check_task_name("with space").is_err());
        assert!(check_task_name("   ").is_err());
    }

    #[test]
    fn removal_stops_at_floor() {
        let mut items = vec![spec("a"), spec("b"), spec("c"), spec("d")];
        assert!(remove_respecting_floor(&mut items, 3).is_ok());
        assert_eq!(items.len(), 3);

        let err = remove_respecting_floor(&mut items, 0).unwrap_err();
        assert_eq!(err, "Minimum 3 rubric categories required");
        assert_eq!(items.len(), 3);
    }
}
