use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::helper::normalization::NormalizedTable;

pub const PLOT_FILE: &str = "read_proportions.png";

/// One horizontal bar: spike-in share drawn first, experimental share stacked after it.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedBar {
    pub library: String,
    pub proportion_spike: f64,
    pub proportion_experimental: f64,
}

impl StackedBar {
    pub fn spike_span(&self) -> (f64, f64) {
        (0.0, self.proportion_spike)
    }

    pub fn experimental_span(&self) -> (f64, f64) {
        (
            self.proportion_spike,
            self.proportion_spike + self.proportion_experimental,
        )
    }
}

pub fn stacked_bars(table: &NormalizedTable) -> Vec<StackedBar> {
    table
        .records()
        .iter()
        .map(|r| StackedBar {
            library: r.library().to_owned(),
            proportion_spike: *r.proportion_spike(),
            proportion_experimental: *r.proportion_experimental(),
        })
        .collect()
}

// stacked horizontal bar chart of the read proportions on both genomes
pub fn plot_read_proportions(
    table: &NormalizedTable,
    experimental_genome: &str,
    spike_in_genome: &str,
    output_path: &Path,
) -> Result<(), Box<dyn Error>> {
    let bars = stacked_bars(table);
    let n = bars.len();

    let root = BitMapBackend::new(output_path, (500, 1000)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!(
        "Proportion of reads mapped to {} or {}",
        spike_in_genome, experimental_genome
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 16).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(160)
        .build_cartesian_2d(0f64..1f64, (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("proportion reads mapped")
        .y_labels(n)
        .x_label_formatter(&|x| format!("{:.1}", x))
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => bars
                .get(*i)
                .map(|b| b.library.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    let spike_color = RED.mix(0.8);
    let experimental_color = BLUE.mix(0.8);

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let (x0, x1) = bar.spike_span();
            let mut rect = Rectangle::new(
                [(x0, SegmentValue::Exact(i)), (x1, SegmentValue::Exact(i + 1))],
                spike_color.filled(),
            );
            rect.set_margin(2, 2, 0, 0);
            rect
        }))?
        .label(spike_in_genome)
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], spike_color.filled()));

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let (x0, x1) = bar.experimental_span();
            let mut rect = Rectangle::new(
                [(x0, SegmentValue::Exact(i)), (x1, SegmentValue::Exact(i + 1))],
                experimental_color.filled(),
            );
            rect.set_margin(2, 2, 0, 0);
            rect
        }))?
        .label(experimental_genome)
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 10, y + 5)], experimental_color.filled())
        });

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::library::{IdMatcher, LibraryRecord, LibraryTable, MemberSelector};
    use crate::helper::normalization::{GroupSpec, normalize};

    #[test]
    fn test_stacked_bars_cover_unit_interval() {
        let table: LibraryTable = vec![
            LibraryRecord::new("a_input", 300, 100),
            LibraryRecord::new("a_IP", 950, 50),
        ]
        .into_iter()
        .collect();
        let groups = vec![GroupSpec {
            name: "a".to_string(),
            members: MemberSelector {
                rows: None,
                id: None,
            },
            reference: IdMatcher::Contains("input".to_string()),
        }];
        let normalized = normalize(&table, &groups, 16).unwrap();

        let bars = stacked_bars(&normalized);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].library, "a_input");
        assert_eq!(bars[0].spike_span(), (0.0, 0.25));
        assert_eq!(bars[1].spike_span(), (0.0, 0.05));
        for bar in &bars {
            let (start, end) = bar.experimental_span();
            assert_eq!(start, bar.proportion_spike);
            assert!((end - 1.0).abs() < 1e-12);
        }
    }
}
