//! Census aggregation: race counts, education and income shares, working
//! hours and the best-earning countries.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analyzers::types::CensusRow;
use crate::error::AnalysisError;
use crate::output::write_csv_with_retry;
use crate::stats::{mean, pct, round1};
use crate::table::{idxmax, load_rows, value_counts};

/// File stem of the CSV report, see [`write_report`].
pub const REPORT_STEM: &str = "demographic_data_analyzer";

const HIGHER_EDUCATION: [&str; 3] = ["Bachelors", "Masters", "Doctorate"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicReport {
    /// Rows per race, most frequent first.
    pub race_count: Vec<(String, usize)>,
    pub average_age_men: f64,
    pub percentage_bachelors: f64,
    /// `Bachelors`/`Masters`/`Doctorate` holders earning `>50K`, as a
    /// percentage of all rows.
    pub higher_education_rich: f64,
    /// Everyone else earning `>50K`, as a percentage of all rows.
    pub lower_education_rich: f64,
    pub min_work_hours: u32,
    /// Share earning `>50K` among those working `min_work_hours`.
    pub rich_percentage: f64,
    pub highest_earning_country: String,
    pub highest_earning_country_percentage: f64,
    /// Most common occupation of `>50K` earners from India, if any.
    pub top_in_occupation: Option<String>,
}

/// Flat one-row form of [`DemographicReport`] for CSV output.
#[derive(Debug, Serialize)]
struct ReportRecord<'a> {
    race_count: String,
    average_age_men: f64,
    percentage_bachelors: f64,
    higher_education_rich: f64,
    lower_education_rich: f64,
    min_work_hours: u32,
    rich_percentage: f64,
    highest_earning_country: &'a str,
    highest_earning_country_percentage: f64,
    #[serde(rename = "top_IN_occupation")]
    top_in_occupation: Option<&'a str>,
}

impl DemographicReport {
    /// `race_count` as `race=count` pairs joined by `;`.
    pub fn race_count_field(&self) -> String {
        self.race_count
            .iter()
            .map(|(race, n)| format!("{race}={n}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    fn record(&self) -> ReportRecord<'_> {
        ReportRecord {
            race_count: self.race_count_field(),
            average_age_men: self.average_age_men,
            percentage_bachelors: self.percentage_bachelors,
            higher_education_rich: self.higher_education_rich,
            lower_education_rich: self.lower_education_rich,
            min_work_hours: self.min_work_hours,
            rich_percentage: self.rich_percentage,
            highest_earning_country: &self.highest_earning_country,
            highest_earning_country_percentage: self.highest_earning_country_percentage,
            top_in_occupation: self.top_in_occupation.as_deref(),
        }
    }
}

/// Loads the census file at `path` and computes the report.
#[tracing::instrument(fields(path = %path.display()))]
pub fn analyze_file(path: &Path, delimiter: u8) -> Result<DemographicReport> {
    let rows: Vec<CensusRow> = load_rows(path, delimiter)?;
    Ok(calculate_demographic_data(&rows)?)
}

/// Computes every census aggregate over `rows`.
///
/// # Errors
///
/// [`AnalysisError::EmptyTable`] when `rows` is empty.
pub fn calculate_demographic_data(rows: &[CensusRow]) -> Result<DemographicReport, AnalysisError> {
    if rows.is_empty() {
        return Err(AnalysisError::EmptyTable("census"));
    }
    let total = rows.len();

    let race_count = value_counts(rows.iter().map(|r| r.race.as_str()));

    let men_ages: Vec<f64> = rows
        .iter()
        .filter(|r| r.sex == "Male")
        .map(|r| r.age as f64)
        .collect();
    let average_age_men = round1(mean(&men_ages));

    let bachelors = rows.iter().filter(|r| r.education == "Bachelors").count();
    let percentage_bachelors = round1(pct(bachelors, total));

    let (higher, lower): (Vec<&CensusRow>, Vec<&CensusRow>) = rows
        .iter()
        .partition(|r| HIGHER_EDUCATION.contains(&r.education.as_str()));
    let rich_in = |group: &[&CensusRow]| group.iter().filter(|r| r.is_rich()).count();
    let higher_education_rich = round1(pct(rich_in(higher.as_slice()), total));
    let lower_education_rich = round1(pct(rich_in(lower.as_slice()), total));

    // non-empty, checked above
    let min_work_hours = rows.iter().map(|r| r.hours_per_week).min().unwrap_or(0);
    let min_workers: Vec<&CensusRow> = rows
        .iter()
        .filter(|r| r.hours_per_week == min_work_hours)
        .collect();
    let rich_percentage = round1(pct(rich_in(min_workers.as_slice()), min_workers.len()));

    let (highest_earning_country, country_ratio) = highest_earning_country(rows);
    let highest_earning_country_percentage = round1(country_ratio * 100.0);

    let india_rich = rows
        .iter()
        .filter(|r| r.is_rich() && r.native_country == "India")
        .map(|r| r.occupation.as_str());
    let top_in_occupation = idxmax(&value_counts(india_rich)).map(str::to_string);

    debug!(
        total,
        higher = higher.len(),
        lower = lower.len(),
        min_workers = min_workers.len(),
        "Census aggregates computed"
    );

    Ok(DemographicReport {
        race_count,
        average_age_men,
        percentage_bachelors,
        higher_education_rich,
        lower_education_rich,
        min_work_hours,
        rich_percentage,
        highest_earning_country,
        highest_earning_country_percentage,
        top_in_occupation,
    })
}

/// Country with the largest share of `>50K` rows among its own rows, and
/// that share as a fraction. Ties go to the alphabetically first country.
fn highest_earning_country(rows: &[CensusRow]) -> (String, f64) {
    let mut per_country: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for r in rows {
        let entry = per_country.entry(r.native_country.as_str()).or_default();
        entry.0 += 1;
        if r.is_rich() {
            entry.1 += 1;
        }
    }

    let mut best = (String::new(), f64::NEG_INFINITY);
    for (country, (count, rich)) in per_country {
        let ratio = rich as f64 / count as f64;
        if ratio > best.1 {
            best = (country.to_string(), ratio);
        }
    }
    best
}

/// Prints the report as labelled lines on stdout.
pub fn print_report(report: &DemographicReport) {
    println!("Number of each race:");
    for (race, n) in &report.race_count {
        println!("{race:<24}{n}");
    }
    println!("Average age of men: {}", report.average_age_men);
    println!(
        "Percentage with Bachelors degrees: {}%",
        report.percentage_bachelors
    );
    println!(
        "Percentage with higher education that earn >50K: {}%",
        report.higher_education_rich
    );
    println!(
        "Percentage without higher education that earn >50K: {}%",
        report.lower_education_rich
    );
    println!("Min work time: {} hours/week", report.min_work_hours);
    println!(
        "Percentage of rich among those who work fewest hours: {}%",
        report.rich_percentage
    );
    println!(
        "Country with highest percentage of rich: {}",
        report.highest_earning_country
    );
    println!(
        "Highest percentage of rich people in country: {}%",
        report.highest_earning_country_percentage
    );
    println!(
        "Top occupations of rich people in India: {}",
        report.top_in_occupation.as_deref().unwrap_or("none")
    );
}

/// Writes the report as `output_{i}_demographic_data_analyzer.csv` in `dir`.
pub fn write_report(dir: &Path, report: &DemographicReport) -> Result<PathBuf> {
    write_csv_with_retry(dir, REPORT_STEM, &report.record())
}

/// Analyzes `path`, prints the report unless `quiet` and writes it to `out_dir`.
///
/// A `path` that is not a file is reported on stdout and yields `Ok(None)`.
pub fn run(path: &Path, delimiter: u8, quiet: bool, out_dir: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        println!("Error: The file '{}' does not exist.", path.display());
        return Ok(None);
    }

    let report = analyze_file(path, delimiter)?;
    if !quiet {
        print_report(&report);
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    write_report(out_dir, &report).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Salary;

    fn row(age: u32, education: &str, race: &str, sex: &str, hours: u32, country: &str, rich: bool) -> CensusRow {
        CensusRow {
            age,
            education: education.to_string(),
            occupation: if rich { "Prof-specialty" } else { "Sales" }.to_string(),
            race: race.to_string(),
            sex: sex.to_string(),
            hours_per_week: hours,
            native_country: country.to_string(),
            salary: if rich {
                Salary::Above50K
            } else {
                Salary::AtMost50K
            },
        }
    }

    fn sample() -> Vec<CensusRow> {
        vec![
            row(39, "Bachelors", "White", "Male", 40, "United-States", false),
            row(50, "Bachelors", "White", "Male", 13, "United-States", true),
            row(38, "HS-grad", "Black", "Female", 40, "United-States", false),
            row(53, "11th", "Black", "Male", 40, "United-States", false),
            row(28, "Masters", "Black", "Female", 40, "Cuba", true),
            row(37, "Doctorate", "White", "Female", 13, "India", true),
            row(49, "9th", "Asian-Pac-Islander", "Female", 16, "India", false),
            row(52, "HS-grad", "White", "Male", 45, "Cuba", false),
        ]
    }

    #[test]
    fn test_sample_report() {
        let report = calculate_demographic_data(&sample()).unwrap();

        assert_eq!(
            report.race_count,
            vec![
                ("White".to_string(), 4),
                ("Black".to_string(), 3),
                ("Asian-Pac-Islander".to_string(), 1),
            ]
        );
        // (39 + 50 + 53 + 52) / 4 = 48.5
        assert_eq!(report.average_age_men, 48.5);
        assert_eq!(report.percentage_bachelors, 25.0);
        // 3 rich higher-educated rows out of 8, none among the others
        assert_eq!(report.higher_education_rich, 37.5);
        assert_eq!(report.lower_education_rich, 0.0);
        assert_eq!(report.min_work_hours, 13);
        assert_eq!(report.rich_percentage, 100.0);
        // Cuba 1/2, India 1/2, United-States 1/4: Cuba wins the tie alphabetically
        assert_eq!(report.highest_earning_country, "Cuba");
        assert_eq!(report.highest_earning_country_percentage, 50.0);
        assert_eq!(report.top_in_occupation.as_deref(), Some("Prof-specialty"));
    }

    #[test]
    fn test_empty_table() {
        let err = calculate_demographic_data(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyTable("census")));
    }

    #[test]
    fn test_no_rich_in_india() {
        let rows = vec![
            row(30, "HS-grad", "White", "Male", 40, "India", false),
            row(31, "HS-grad", "White", "Male", 20, "Peru", true),
        ];
        let report = calculate_demographic_data(&rows).unwrap();
        assert_eq!(report.top_in_occupation, None);
        assert_eq!(report.highest_earning_country, "Peru");
        assert_eq!(report.rich_percentage, 100.0);
    }

    #[test]
    fn test_percentages_round_to_one_decimal() {
        let rows = vec![
            row(30, "Bachelors", "White", "Male", 40, "Peru", false),
            row(31, "HS-grad", "White", "Male", 40, "Peru", false),
            row(33, "HS-grad", "White", "Female", 40, "Peru", false),
        ];
        let report = calculate_demographic_data(&rows).unwrap();
        assert_eq!(report.percentage_bachelors, 33.3);
        assert_eq!(report.average_age_men, 30.5);
    }

    #[test]
    fn test_write_report_flattens_race_count() {
        let dir = tempfile::tempdir().unwrap();
        let report = calculate_demographic_data(&sample()).unwrap();
        let path = write_report(dir.path(), &report).unwrap();

        assert!(path.ends_with("output_1_demographic_data_analyzer.csv"));
        let content = std::fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("race_count,average_age_men"));
        assert!(header.ends_with("top_IN_occupation"));
        let data = lines.next().unwrap();
        assert!(data.starts_with("White=4;Black=3;Asian-Pac-Islander=1,48.5,25.0"));
    }

    #[test]
    fn test_education_shares_use_total_rows() {
        let rows = vec![
            row(30, "Masters", "White", "Male", 40, "Peru", true),
            row(31, "Masters", "White", "Male", 40, "Peru", false),
            row(32, "HS-grad", "White", "Male", 40, "Peru", true),
            row(33, "HS-grad", "White", "Male", 40, "Peru", false),
        ];
        let report = calculate_demographic_data(&rows).unwrap();
        // 1 of 4 rows each, not 1 of 2 per group
        assert_eq!(report.higher_education_rich, 25.0);
        assert_eq!(report.lower_education_rich, 25.0);
        assert_eq!(report.rich_percentage, 50.0);
    }

    #[test]
    fn test_run_missing_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_file.csv");

        let written = run(&missing, b',', true, dir.path()).unwrap();

        assert_eq!(written, None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_run_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        assert_eq!(run(dir.path(), b',', true, &out).unwrap(), None);
        assert!(!out.exists());
    }

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("adult.csv");
        std::fs::write(
            &input,
            "age,education,occupation,race,sex,hours-per-week,native-country,salary\n\
             39,Bachelors,Sales,White,Male,40,Peru,<=50K\n\
             50,Masters,Exec-managerial,White,Female,13,Peru,>50K\n",
        )
        .unwrap();
        let out = dir.path().join("reports");

        let written = run(&input, b',', true, &out).unwrap().unwrap();
        assert_eq!(written, out.join("output_1_demographic_data_analyzer.csv"));
        assert!(written.exists());
    }
}
