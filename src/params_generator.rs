use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};

use crate::cli::BANNER;
use crate::helper::normalization::DEFAULT_ALPHA_PRECISION;
use crate::helper::params::{GroupParams, Params};

pub fn exec() -> Result<(), Box<dyn Error>> {
    println!("{}", BANNER);

    println!("{}", "-".repeat(58));
    println!(
        "| JSON Parameter Generator for chip-norm {:<17}|",
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", "-".repeat(58));

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();

    let params = generate(&mut reader, &mut writer)?;

    print!("Save the param file to (default as params.json):\n>  ");
    let path = match collect_input(&mut reader, &mut writer)?.as_str() {
        "" => "params.json".to_string(),
        input => input.to_string(),
    };

    fs::write(&path, params.to_json_string()?)?;

    println!("Your entered parameters: ");
    println!("{}", params);
    println!("Param file written to {}", path);
    Ok(())
}

/// Walks through the prompts and builds a validated `Params`.
pub fn generate<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> Result<Params, Box<dyn Error>> {
    write!(
        writer,
        "Enter the experimental genome count log file name (default as experimental_counts.log):\n>  "
    )?;
    let experimental_log = match collect_input(reader, writer)?.as_str() {
        "" => "experimental_counts.log".to_string(),
        input => input.to_string(),
    };

    write!(
        writer,
        "Enter the spike-in genome count log file name (default as spikein_counts.log):\n>  "
    )?;
    let spike_in_log = match collect_input(reader, writer)?.as_str() {
        "" => "spikein_counts.log".to_string(),
        input => input.to_string(),
    };

    write!(
        writer,
        "Enter the expected number of libraries (optional):\n>  "
    )?;
    let expected_libraries = collect_input(reader, writer)?.parse::<usize>().ok();

    write!(
        writer,
        "Enter the substring marking input libraries (default as input):\n>  "
    )?;
    let reference_marker = match collect_input(reader, writer)?.as_str() {
        "" => "input".to_string(),
        input => input.to_string(),
    };

    write!(
        writer,
        "Group libraries by (1-2):\n1. fixed-size blocks (default)\n2. named groups\n>  "
    )?;
    let named_groups = collect_input(reader, writer)? == "2";

    let mut block_size = None;
    let mut groups: Vec<GroupParams> = Vec::new();

    if named_groups {
        loop {
            write!(writer, "Enter the group name:\n>  ")?;
            let name = collect_input(reader, writer)?;

            write!(
                writer,
                "Enter the tag shared by the group's library names (default as the group name):\n>  "
            )?;
            let tag = match collect_input(reader, writer)?.as_str() {
                "" => name.clone(),
                input => input.to_string(),
            };

            write!(
                writer,
                "Enter the first and last row of the group, e.g. 1-4 (optional):\n>  "
            )?;
            let (start, end) = parse_row_range(&collect_input(reader, writer)?);

            groups.push(GroupParams {
                name,
                start,
                end,
                tag: Some(tag),
                pattern: None,
                reference: None,
            });

            write!(writer, "Add another group? (y/n, default as n):\n>  ")?;
            match collect_input(reader, writer)?.as_str() {
                "y" | "Y" => continue,
                _ => break,
            };
        }
    } else {
        write!(writer, "Enter the number of libraries per block (default as 4):\n>  ")?;
        block_size = Some(match collect_input(reader, writer)?.as_str() {
            "" => 4,
            input => input.parse::<usize>().unwrap_or(4).max(1),
        });
    }

    let params = Params {
        experimental_log,
        spike_in_log,
        output_table: "normalization_table.csv".to_string(),
        experimental_genome: "S. cerevisiae".to_string(),
        spike_in_genome: "S. pombe".to_string(),
        expected_libraries,
        reference_marker,
        precision: DEFAULT_ALPHA_PRECISION,
        strict_names: false,
        block_size,
        groups,
    };

    params.validate()?;
    Ok(params)
}

// "1-4" (1-based, inclusive) to 0-based half-open bounds
fn parse_row_range(input: &str) -> (Option<usize>, Option<usize>) {
    let Some((first, last)) = input.split_once('-') else {
        return (None, None);
    };
    match (first.trim().parse::<usize>(), last.trim().parse::<usize>()) {
        (Ok(first), Ok(last)) if first >= 1 && last >= first => (Some(first - 1), Some(last)),
        _ => (None, None),
    }
}

fn collect_input<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<String> {
    writer.flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_generate_blocks() {
        let answers = "\n\n16\n\n1\n4\n";
        let mut reader = Cursor::new(answers.as_bytes());
        let mut out: Vec<u8> = Vec::new();

        let params = generate(&mut reader, &mut out).unwrap();
        assert_eq!(params.experimental_log, "experimental_counts.log");
        assert_eq!(params.spike_in_log, "spikein_counts.log");
        assert_eq!(params.expected_libraries, Some(16));
        assert_eq!(params.reference_marker, "input");
        assert_eq!(params.block_size, Some(4));
        assert!(params.groups.is_empty());
    }

    #[test]
    fn test_generate_named_groups() {
        let answers = "rep4_counts.log\nrep4_spikein_counts.log\n\nInput\n2\n93_D\n\n1-4\ny\n93_I\n93_I\n5-8\nn\n";
        let mut reader = Cursor::new(answers.as_bytes());
        let mut out: Vec<u8> = Vec::new();

        let params = generate(&mut reader, &mut out).unwrap();
        assert_eq!(params.reference_marker, "Input");
        assert_eq!(params.expected_libraries, None);
        assert_eq!(params.block_size, None);
        assert_eq!(params.groups.len(), 2);
        assert_eq!(params.groups[0].tag.as_deref(), Some("93_D"));
        assert_eq!(params.groups[0].start, Some(0));
        assert_eq!(params.groups[0].end, Some(4));
        assert_eq!(params.groups[1].start, Some(4));
        assert_eq!(params.groups[1].end, Some(8));
    }

    #[test]
    fn test_parse_row_range() {
        assert_eq!(parse_row_range("1-4"), (Some(0), Some(4)));
        assert_eq!(parse_row_range(" 13 - 16 "), (Some(12), Some(16)));
        assert_eq!(parse_row_range("4-1"), (None, None));
        assert_eq!(parse_row_range("0-3"), (None, None));
        assert_eq!(parse_row_range(""), (None, None));
    }
}
