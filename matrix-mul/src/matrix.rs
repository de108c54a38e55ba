//! Dense integer matrices and their text format.
//!
//! The format is `"<rows> <cols>"` followed by `rows * cols` integers in
//! row-major order. Loading is token based, so line layout after the header
//! is not significant. Writing puts one row per line, each value followed by
//! a single space.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// Cap on elements reserved up front from an untrusted header.
const MAX_PREALLOC: usize = 1 << 20;

/// A row-major matrix of `i64` values. Both dimensions are non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

impl Matrix {
    /// Builds a matrix from nested rows, which must all have the same
    /// non-zero length.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, Error> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || cols == 0 {
            return Err(Error::Parse("matrix must have at least one row and column".into()));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(Error::Parse(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                cols
            )));
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Zero-filled matrix used as the destination of a multiplication.
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// Reads one matrix from a whitespace token stream, leaving any
    /// following tokens untouched.
    pub fn from_tokens<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Self, Error> {
        let rows = next_dimension(tokens, "row count")?;
        let cols = next_dimension(tokens, "column count")?;

        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| Error::Parse(format!("{}x{} matrix is too large", rows, cols)))?;
        let mut data = Vec::with_capacity(expected.min(MAX_PREALLOC));
        for token in tokens.take(expected) {
            let value = token
                .parse::<i64>()
                .map_err(|e| Error::Parse(format!("bad element {:?}: {}", token, e)))?;
            data.push(value);
        }
        if data.len() != expected {
            return Err(Error::Parse(format!(
                "{}x{} matrix needs {} elements, found {}",
                rows,
                cols,
                expected,
                data.len()
            )));
        }

        Ok(Self { rows, cols, data })
    }

    /// Loads a matrix file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Read {
                path: path.to_path_buf(),
                source,
            })?;
        content.parse()
    }

    /// Writes the matrix in the result format, replacing any existing file.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        tokio::fs::write(path, self.to_string())
            .await
            .map_err(|source| Error::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    pub fn row(&self, row: usize) -> &[i64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn to_rows(&self) -> Vec<Vec<i64>> {
        self.data.chunks_exact(self.cols).map(<[i64]>::to_vec).collect()
    }

    /// Copy of rows `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or `end > self.rows()`.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        Self {
            rows: end - start,
            cols: self.cols,
            data: self.data[start * self.cols..end * self.cols].to_vec(),
        }
    }

    /// Whether `self * other` is defined.
    pub fn conformable(&self, other: &Matrix) -> bool {
        self.cols == other.rows
    }

    /// One element of `self * other`: the dot product of row `row` of `self`
    /// with column `col` of `other`. Fails with [`Error::Overflow`] when the
    /// exact value does not fit in an `i64`.
    ///
    /// # Panics
    ///
    /// Panics if the matrices are not conformable, `row >= self.rows()` or
    /// `col >= other.cols()`.
    pub fn product_cell(&self, other: &Matrix, row: usize, col: usize) -> Result<i64, Error> {
        assert!(self.conformable(other), "product of non-conformable matrices");
        assert!(col < other.cols, "column {} out of range", col);

        self.row(row)
            .iter()
            .enumerate()
            .try_fold(0i64, |sum, (i, a)| {
                a.checked_mul(other.data[i * other.cols + col])
                    .and_then(|p| sum.checked_add(p))
            })
            .ok_or(Error::Overflow { row, col })
    }

    /// Overwrites whole rows starting at `start_row` with `values`.
    pub(crate) fn fill_rows(&mut self, start_row: usize, values: &[i64]) {
        let offset = start_row * self.cols;
        self.data[offset..offset + values.len()].copy_from_slice(values);
    }
}

fn next_dimension<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<usize, Error> {
    let token = tokens
        .next()
        .ok_or_else(|| Error::Parse(format!("missing {}", what)))?;
    match token.parse::<usize>() {
        Ok(0) => Err(Error::Parse(format!("{} must be positive", what))),
        Ok(n) => Ok(n),
        Err(e) => Err(Error::Parse(format!("bad {} {:?}: {}", what, token, e))),
    }
}

impl FromStr for Matrix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let matrix = Self::from_tokens(&mut tokens)?;
        if let Some(extra) = tokens.next() {
            return Err(Error::Parse(format!("unexpected trailing value {:?}", extra)));
        }
        Ok(matrix)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.rows, self.cols)?;
        for row in self.data.chunks_exact(self.cols) {
            for value in row {
                write!(f, "{} ", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap()
    }

    #[test]
    fn parses_text_format() {
        let m: Matrix = "2 3\n1 2 3\n4 5 6\n".parse().unwrap();
        assert_eq!(m, sample());
        assert_eq!(m.row(1), &[4, 5, 6]);
    }

    #[test]
    fn line_layout_is_not_significant() {
        let m: Matrix = "2 3 1 2\n3 4\n5 6".parse().unwrap();
        assert_eq!(m, sample());
    }

    #[test]
    fn negative_values() {
        let m: Matrix = "1 2\n-7 8\n".parse().unwrap();
        assert_eq!(m.row(0), &[-7, 8]);
    }

    #[test]
    fn rejects_short_data() {
        let err = "2 2\n1 2\n3\n".parse::<Matrix>().unwrap_err();
        assert!(err.to_string().contains("needs 4 elements, found 3"));
    }

    #[test]
    fn rejects_trailing_data() {
        assert!("1 1\n1 2\n".parse::<Matrix>().is_err());
    }

    #[test]
    fn rejects_zero_and_bad_dimensions() {
        assert!("0 3\n".parse::<Matrix>().is_err());
        assert!("2 0\n".parse::<Matrix>().is_err());
        assert!("two 2\n".parse::<Matrix>().is_err());
        assert!("".parse::<Matrix>().is_err());
    }

    #[test]
    fn rejects_bad_element() {
        let err = "1 2\n1 x\n".parse::<Matrix>().unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn from_rows_rejects_ragged() {
        assert!(Matrix::from_rows(vec![vec![1, 2], vec![3]]).is_err());
        assert!(Matrix::from_rows(vec![]).is_err());
    }

    #[test]
    fn display_has_trailing_spaces() {
        assert_eq!(sample().to_string(), "2 3\n1 2 3 \n4 5 6 \n");
    }

    #[test]
    fn tokens_leave_rest_of_stream() {
        let text = "1 2\n1 2\n2 1\n3\n4\n";
        let mut tokens = text.split_whitespace();

        let a = Matrix::from_tokens(&mut tokens).unwrap();
        let b = Matrix::from_tokens(&mut tokens).unwrap();

        assert_eq!(a.to_rows(), vec![vec![1, 2]]);
        assert_eq!(b.to_rows(), vec![vec![3], vec![4]]);
        assert!(tokens.next().is_none());
    }

    #[test]
    fn product_cell_is_dot_product() {
        let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        let b = Matrix::from_rows(vec![vec![5, 6], vec![7, 8]]).unwrap();

        assert!(a.conformable(&b));
        assert_eq!(a.product_cell(&b, 0, 0).unwrap(), 19);
        assert_eq!(a.product_cell(&b, 0, 1).unwrap(), 22);
        assert_eq!(a.product_cell(&b, 1, 0).unwrap(), 43);
        assert_eq!(a.product_cell(&b, 1, 1).unwrap(), 50);
    }

    #[test]
    fn product_cell_reports_overflow() {
        let big = i64::MAX / 2 + 1;
        let a = Matrix::from_rows(vec![vec![1, 1], vec![big, big]]).unwrap();
        let b = Matrix::from_rows(vec![vec![1], vec![1]]).unwrap();

        assert_eq!(a.product_cell(&b, 0, 0).unwrap(), 2);
        let err = a.product_cell(&b, 1, 0).unwrap_err();
        assert!(matches!(err, Error::Overflow { row: 1, col: 0 }));

        let square = Matrix::from_rows(vec![vec![big]]).unwrap();
        let err = square.product_cell(&square, 0, 0).unwrap_err();
        assert!(matches!(err, Error::Overflow { row: 0, col: 0 }));
    }

    #[test]
    #[should_panic(expected = "non-conformable")]
    fn product_cell_panics_on_non_conformable() {
        let a = Matrix::from_rows(vec![vec![1, 2]]).unwrap();
        let _ = a.product_cell(&a, 0, 0);
    }

    #[test]
    fn slice_and_fill_rows() {
        let m = Matrix::from_rows(vec![vec![1], vec![2], vec![3], vec![4]]).unwrap();
        let middle = m.slice_rows(1, 3);
        assert_eq!(middle.to_rows(), vec![vec![2], vec![3]]);

        let mut z = Matrix::zeros(4, 1);
        z.fill_rows(2, &[9, 9]);
        assert_eq!(z.to_rows(), vec![vec![0], vec![0], vec![9], vec![9]]);
    }

    #[tokio::test]
    async fn write_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.txt");
        let m = Matrix::from_rows(vec![vec![-1, 20], vec![300, 4], vec![5, -60]]).unwrap();

        m.write_to(&path).await.unwrap();
        let loaded = Matrix::load(&path).await.unwrap();

        assert_eq!(loaded, m);
    }

    #[tokio::test]
    async fn write_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.txt");
        std::fs::write(&path, "stale contents that are much longer than the result\n").unwrap();

        Matrix::from_rows(vec![vec![1]]).unwrap().write_to(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1 1\n1 \n");
    }

    #[tokio::test]
    async fn load_missing_file_names_path() {
        let err = Matrix::load("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
