/// LU decomposition with partial (row) pivoting of banded matrices in compact band storage
pub mod band_lu;
