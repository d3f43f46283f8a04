//! Selected series and the sample iterator protocol

use crate::types::{Labels, Point};

/// What an iterator step produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Iterator is exhausted
    None,
    /// A float sample is available through [`SampleIterator::at`]
    Float,
}

/// Cursor over one series, the protocol an expression engine consumes
///
/// Positions only move forward.
pub trait SampleIterator {
    /// Advance to the next sample
    fn next(&mut self) -> ValueType;

    /// Advance to the first sample with `timestamp >= t`
    ///
    /// Does not move when the current sample already satisfies the bound,
    /// and never moves backwards.
    fn seek(&mut self, t: i64) -> ValueType;

    /// Current `(timestamp, value)`
    ///
    /// Only meaningful after `next`/`seek` returned [`ValueType::Float`];
    /// otherwise `(i64::MIN, NaN)`.
    fn at(&self) -> (i64, f64);
}

/// One series: a label set and its points in timestamp order
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    labels: Labels,
    points: Vec<Point>,
}

impl Series {
    /// Create a series, ordering points by timestamp
    ///
    /// The sort is stable, so equal timestamps keep their given order.
    pub fn new(labels: Labels, mut points: Vec<Point>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { labels, points }
    }

    /// Full label set, `__name__` included
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Points in timestamp order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fresh iterator positioned before the first point
    pub fn iter(&self) -> SeriesIterator<'_> {
        SeriesIterator {
            points: &self.points,
            cursor: Cursor::Fresh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Fresh,
    At(usize),
    Exhausted,
}

/// [`SampleIterator`] over a [`Series`]
#[derive(Debug, Clone)]
pub struct SeriesIterator<'a> {
    points: &'a [Point],
    cursor: Cursor,
}

impl SeriesIterator<'_> {
    fn position(&mut self, idx: usize) -> ValueType {
        if idx < self.points.len() {
            self.cursor = Cursor::At(idx);
            ValueType::Float
        } else {
            self.cursor = Cursor::Exhausted;
            ValueType::None
        }
    }
}

impl SampleIterator for SeriesIterator<'_> {
    fn next(&mut self) -> ValueType {
        match self.cursor {
            Cursor::Fresh => self.position(0),
            Cursor::At(i) => self.position(i + 1),
            Cursor::Exhausted => ValueType::None,
        }
    }

    fn seek(&mut self, t: i64) -> ValueType {
        let start = match self.cursor {
            Cursor::Exhausted => return ValueType::None,
            Cursor::Fresh => 0,
            Cursor::At(i) => {
                if self.points[i].timestamp >= t {
                    return ValueType::Float;
                }
                i + 1
            }
        };

        let offset = self.points[start..].partition_point(|p| p.timestamp < t);
        self.position(start + offset)
    }

    fn at(&self) -> (i64, f64) {
        match self.cursor {
            Cursor::At(i) => {
                let p = self.points[i];
                (p.timestamp, p.value)
            }
            Cursor::Fresh | Cursor::Exhausted => (i64::MIN, f64::NAN),
        }
    }
}

/// Result of a select: series plus non-fatal warnings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    series: Vec<Series>,
    warnings: Vec<String>,
}

impl SeriesSet {
    /// Create from selected series
    pub fn new(series: Vec<Series>) -> Self {
        Self {
            series,
            warnings: Vec::new(),
        }
    }

    /// Empty set carrying one warning
    pub fn with_warning(warning: impl Into<String>) -> Self {
        Self {
            series: Vec::new(),
            warnings: vec![warning.into()],
        }
    }

    /// Selected series
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Warnings raised while selecting
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Number of series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether no series were selected
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Iterate series
    pub fn iter(&self) -> std::slice::Iter<'_, Series> {
        self.series.iter()
    }
}

impl IntoIterator for SeriesSet {
    type Item = Series;
    type IntoIter = std::vec::IntoIter<Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_iter()
    }
}

impl<'a> IntoIterator for &'a SeriesSet {
    type Item = &'a Series;
    type IntoIter = std::slice::Iter<'a, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(ts: &[i64]) -> Series {
        let points = ts.iter().map(|&t| Point::new(t, t as f64 / 10.0)).collect();
        Series::new(Labels::with_name("up"), points)
    }

    #[test]
    fn test_points_sorted_stably() {
        let s = Series::new(
            Labels::with_name("up"),
            vec![
                Point::new(30, 1.0),
                Point::new(10, 2.0),
                Point::new(30, 3.0),
                Point::new(20, 4.0),
            ],
        );
        let values: Vec<f64> = s.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn test_next_walks_all_points() {
        let s = series(&[10, 20, 30]);
        let mut it = s.iter();

        let mut seen = Vec::new();
        while it.next() == ValueType::Float {
            seen.push(it.at().0);
        }
        assert_eq!(seen, vec![10, 20, 30]);
        assert_eq!(it.next(), ValueType::None);
        assert_eq!(it.seek(0), ValueType::None);
    }

    #[test]
    fn test_at_before_start() {
        let s = series(&[10]);
        let it = s.iter();
        let (t, v) = it.at();
        assert_eq!(t, i64::MIN);
        assert!(v.is_nan());
    }

    #[test]
    fn test_seek() {
        let s = series(&[10, 20, 30, 40]);
        let mut it = s.iter();

        assert_eq!(it.seek(15), ValueType::Float);
        assert_eq!(it.at(), (20, 2.0));

        // Already satisfied: stays put
        assert_eq!(it.seek(5), ValueType::Float);
        assert_eq!(it.at().0, 20);
        assert_eq!(it.seek(20), ValueType::Float);
        assert_eq!(it.at().0, 20);

        assert_eq!(it.seek(40), ValueType::Float);
        assert_eq!(it.at().0, 40);
        assert_eq!(it.seek(41), ValueType::None);
        assert_eq!(it.next(), ValueType::None);
    }

    #[test]
    fn test_seek_then_next() {
        let s = series(&[10, 20, 30]);
        let mut it = s.iter();
        assert_eq!(it.seek(20), ValueType::Float);
        assert_eq!(it.next(), ValueType::Float);
        assert_eq!(it.at().0, 30);
    }

    #[test]
    fn test_empty_series() {
        let s = series(&[]);
        assert!(s.is_empty());
        assert_eq!(s.iter().next(), ValueType::None);
        assert_eq!(s.iter().seek(0), ValueType::None);
    }

    #[test]
    fn test_independent_iterators() {
        let s = series(&[10, 20]);
        let mut a = s.iter();
        let mut b = s.iter();
        a.next();
        a.next();
        b.next();
        assert_eq!(a.at().0, 20);
        assert_eq!(b.at().0, 10);
    }

    #[test]
    fn test_series_set_warning() {
        let set = SeriesSet::with_warning("bad matcher");
        assert!(set.is_empty());
        assert_eq!(set.warnings(), &["bad matcher".to_string()]);
    }
}
