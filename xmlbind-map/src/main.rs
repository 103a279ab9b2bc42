#![deny(clippy::all, clippy::pedantic)]

use hashbrown::HashMap;
use log::{error, info};
use memmap::Mmap;
use std::fs::create_dir_all;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use structopt::StructOpt;
use xmlbind::{DateOrder, Deserializer, Locale, Record, RecordType, Schema};

#[derive(Debug, StructOpt)]
#[structopt(name = "xmlbind-map")]
struct Opt {
    /// JSON schema describing the target record
    #[structopt(parse(from_os_str))]
    schema: PathBuf,
    #[structopt(parse(from_os_str), required = true)]
    inputs: Vec<PathBuf>,
    /// Write `<stem>.json` per input here instead of printing to stdout
    #[structopt(long, parse(from_os_str))]
    out_dir: Option<PathBuf>,
    /// Custom date pattern, e.g. "dd yyyy MMM, hh:mm ss tt zzz"
    #[structopt(long)]
    date_format: Option<String>,
    /// Map from the first element with this name instead of the root
    #[structopt(long)]
    root_element: Option<String>,
    #[structopt(long, default_value = ".")]
    decimal_separator: char,
    /// Defaults to "," unless that is the decimal separator
    #[structopt(long)]
    group_separator: Option<char>,
    /// Short dates are day/month/year
    #[structopt(long)]
    day_first: bool,
}

type Error = Box<dyn std::error::Error + Send + Sync>;

impl Opt {
    fn deserializer(&self) -> Deserializer {
        let order = if self.day_first {
            DateOrder::DayMonthYear
        } else {
            DateOrder::MonthDayYear
        };
        let mut locale = Locale::invariant()
            .decimal_separator(self.decimal_separator)
            .date_order(order);
        if self.group_separator.is_some() {
            locale = locale.group_separator(self.group_separator);
        }

        let mut deserializer = Deserializer::new().locale(locale);
        if let Some(ref pattern) = self.date_format {
            deserializer.set_date_format(pattern);
        }
        if let Some(ref name) = self.root_element {
            deserializer = deserializer.root_element(name);
        }
        deserializer
    }
}

fn load_schema(path: &Path) -> Result<RecordType, Error> {
    let json = std::fs::read_to_string(path)?;
    Ok(Schema::from_json(&json)?.compile()?)
}

fn map_input(
    path: &Path,
    record_type: &RecordType,
    deserializer: &Deserializer,
) -> Result<Record, Error> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let content = std::str::from_utf8(&mmap)?;
    Ok(deserializer.deserialize_into(content, record_type.instance(), record_type.descriptor())?)
}

/// `<stem>.json` under `dir` for every input; two inputs sharing a stem
/// would overwrite each other and are refused.
fn output_paths(dir: &Path, inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    inputs
        .iter()
        .map(|input| -> Result<PathBuf, Error> {
            let stem = input.file_stem().unwrap_or_else(|| input.as_os_str());
            let path = dir.join(format!("{}.json", stem.to_string_lossy()));
            if let Some(previous) = seen.insert(path.clone(), input) {
                return Err(format!("{:?} and {:?} both map to {:?}", previous, input, path).into());
            }
            Ok(path)
        })
        .collect()
}

fn write_record(record: &Record, path: &Path) -> Result<(), Error> {
    info!("writing {:?}", path);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opt = Opt::from_args();

    info!("compiling schema {:?}", &opt.schema);
    let record_type = load_schema(&opt.schema)?;
    let deserializer = opt.deserializer();
    let outputs = match opt.out_dir {
        Some(ref out_dir) => {
            let outputs = output_paths(out_dir, &opt.inputs)?;
            create_dir_all(out_dir)?;
            Some(outputs)
        }
        None => None,
    };

    let results = Arc::new(Mutex::new(Vec::with_capacity(opt.inputs.len())));

    rayon::scope(|s| {
        for (index, input) in opt.inputs.iter().enumerate() {
            let results = results.clone();
            let record_type = &record_type;
            let deserializer = &deserializer;
            let output = outputs.as_ref().map(|paths| paths[index].as_path());
            s.spawn(move |_| {
                let result = map_input(input, record_type, deserializer).and_then(|record| {
                    match output {
                        Some(path) => write_record(&record, path).map(|()| None),
                        None => Ok(Some(record)),
                    }
                });
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((index, result));
            })
        }
    });

    let mut results = results.lock().unwrap_or_else(PoisonError::into_inner);
    results.sort_by_key(|&(index, _)| index);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0;
    for (index, result) in results.drain(..) {
        match result {
            Ok(Some(record)) => {
                serde_json::to_writer_pretty(&mut out, &record)?;
                writeln!(out)?;
            }
            Ok(None) => {}
            Err(e) => {
                error!("{:?}: {}", opt.inputs[index], e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} inputs failed", failed, opt.inputs.len()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_are_named_after_stems() {
        let inputs = vec![PathBuf::from("in/person.xml"), PathBuf::from("venues.v2.xml")];
        let paths = output_paths(Path::new("out"), &inputs).unwrap();
        assert_eq!(
            paths,
            [PathBuf::from("out/person.json"), PathBuf::from("out/venues.v2.json")]
        );
    }

    #[test]
    fn shared_stems_are_refused() {
        let inputs = vec![PathBuf::from("a/person.xml"), PathBuf::from("b/person.xml")];
        let err = output_paths(Path::new("out"), &inputs).unwrap_err();
        assert!(err.to_string().contains("both map to"));
    }

    #[test]
    fn decimal_comma_clears_default_grouping() {
        let opt = Opt::from_iter(&["xmlbind-map", "schema.json", "in.xml", "--decimal-separator", ","]);
        let locale = opt.deserializer().context().locale().clone();
        assert_eq!(locale.decimal_separator, ',');
        assert_eq!(locale.group_separator, None);

        let opt = Opt::from_iter(&[
            "xmlbind-map",
            "schema.json",
            "in.xml",
            "--decimal-separator",
            ",",
            "--group-separator",
            ".",
        ]);
        assert_eq!(opt.deserializer().context().locale().group_separator, Some('.'));
    }
}
