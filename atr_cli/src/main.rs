mod atr;

use atr::AtrModel;
use atr_core::{BandTracker, TrackerConfig};
use chrono::NaiveDateTime;
use csv::Reader;
use std::error::Error;
use std::fs::File;
use std::path::Path;

#[derive(Debug)]
struct CsvRecord {
    timestamp: NaiveDateTime,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let data_dir = args.get(1).map(String::as_str).unwrap_or("data");
    let config = match args.get(2) {
        Some(path) => load_config(Path::new(path))?,
        None => TrackerConfig::default(),
    };

    // 遍历目录下的所有csv文件
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) == Some("csv") {
            println!("Processing file: {:?}", path);
            process_csv_file(&path, &config)?;
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<TrackerConfig, Box<dyn Error>> {
    let file = File::open(path)?;
    let conf = serde_json::from_reader(file)?;
    Ok(TrackerConfig::new(Some(conf))?)
}

fn process_csv_file(path: &Path, config: &TrackerConfig) -> Result<(), Box<dyn Error>> {
    let file = File::open(path)?;
    let mut rdr = Reader::from_reader(file);
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result?;
        bars.push(parse_csv_record(&record)?);
    }

    // Sort by timestamp
    bars.sort_by_key(|b| b.timestamp);

    let mut atr = AtrModel::new(config.atr_period);
    let mut tracker = BandTracker::from_config(config)?;
    let mut total_volume = 0.0;

    for bar in &bars {
        total_volume += bar.volume;
        if let Some(value) = atr.add(bar.high, bar.low, bar.close) {
            // presentation-side rounding, kept out of the core
            let magnitude = (value * 100.0).round() / 100.0;
            tracker.push(magnitude, bar.high, bar.low);
        }
    }

    println!("Analysis completed for {:?}", path);
    println!("Number of bars: {}", bars.len());
    println!("Total volume: {}", total_volume);
    if let Some(first) = bars.first() {
        println!("First timestamp: {}", first.timestamp);
    }
    if let Some(last) = bars.last() {
        println!("Last timestamp: {}", last.timestamp);
    }
    if tracker.sample_count() > 0 {
        println!("Bands: {}", serde_json::to_string(&tracker.metric())?);
    } else {
        println!("Not enough bars to warm up an ATR of period {}", config.atr_period);
    }

    Ok(())
}

fn parse_csv_record(record: &csv::StringRecord) -> Result<CsvRecord, Box<dyn Error>> {
    let timestamp = NaiveDateTime::parse_from_str(&record[0], "%Y-%m-%d %H:%M:%S")?;

    Ok(CsvRecord {
        timestamp,
        high: record[2].parse()?,
        low: record[3].parse()?,
        close: record[4].parse()?,
        volume: record[5].parse()?,
    })
}
