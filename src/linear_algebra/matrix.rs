use std::fmt::Display;
use thiserror::Error;

// |det| below this fraction of the Hadamard bound counts as singular
pub const SINGULAR_EPS:f64 = 1e-12;

#[derive(Error,Debug,Clone,PartialEq)]
pub enum MatrixError {
    #[error("Matrix is singular, determinant {determinant} is too close to zero")]
    SingularError{determinant:f64}
}

type Result<T> = std::result::Result<T,MatrixError>;

pub type Vector3 = [f64;3];

// determinant of [[a,b],[c,d]]
pub fn determinant_2x2(m:&[[f64;2];2]) -> f64 {
    m[0][0]*m[1][1] - m[0][1]*m[1][0]
}

fn norm(v:&Vector3) -> f64 {
    v.iter().map(|n| n*n).sum::<f64>().sqrt()
}

// A double precision 3*3 matrix, row major order
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Matrix3 {
    rows:[Vector3;3]
}

impl Display for Matrix3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i,row) in self.rows.iter().enumerate() {
            write!(f,"[")?;
            for (j,elem) in row.iter().enumerate() {
                if j != 0 {
                    write!(f,",")?;
                }
                write!(f," {elem:8.3}")?;
            }
            write!(f," ]")?;
            if i+1 != self.rows.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self {rows:[[0.0;3];3]}
    }
}

impl From<[Vector3;3]> for Matrix3 {
    fn from(rows:[Vector3;3]) -> Self {
        Self {rows}
    }
}

//public implementations
impl Matrix3 {
    pub fn new(rows:[Vector3;3]) -> Self {
        Self {rows}
    }
    pub fn identity() -> Self {
        let mut m = Self::default();
        for i in 0..3 {
            m.rows[i][i] = 1.0;
        }
        m
    }
    pub fn get(&self,row:usize,col:usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    // 2*2 matrix left after striking out (row,col)
    pub fn minor(&self,row:usize,col:usize) -> Option<[[f64;2];2]> {
        if row >= 3 || col >= 3 {
            return None
        }
        Some(self.minor_unchecked(row, col))
    }

    pub fn cofactor(&self,row:usize,col:usize) -> Option<f64> {
        if row >= 3 || col >= 3 {
            return None
        }
        Some(self.cofactor_unchecked(row, col))
    }

    // row, col < 3
    fn minor_unchecked(&self,row:usize,col:usize) -> [[f64;2];2] {
        debug_assert!(row < 3 && col < 3);
        let mut sub = [[0.0;2];2];
        let kept_rows = (0..3).filter(|r| *r != row);
        for (i,r) in kept_rows.enumerate() {
            let kept_cols = (0..3).filter(|c| *c != col);
            for (j,c) in kept_cols.enumerate() {
                sub[i][j] = self.rows[r][c];
            }
        }
        sub
    }

    fn cofactor_unchecked(&self,row:usize,col:usize) -> f64 {
        let sign = if (row + col) % 2 == 0 {1.0} else {-1.0};
        sign*determinant_2x2(&self.minor_unchecked(row, col))
    }

    // expansion along the first row
    pub fn determinant(&self) -> f64 {
        let [a,b,c] = self.rows[0];
        let m = &self.rows;
        a*(m[1][1]*m[2][2] - m[1][2]*m[2][1])
            - b*(m[1][0]*m[2][2] - m[1][2]*m[2][0])
            + c*(m[1][0]*m[2][1] - m[1][1]*m[2][0])
    }

    pub fn inverse(&self) -> Result<Self> {
        self.inverse_with_tolerance(SINGULAR_EPS)
    }

    // adjugate over determinant
    // singular when |det| <= eps * prod(|row_i|), which bounds |det| from above
    pub fn inverse_with_tolerance(&self,eps:f64) -> Result<Self> {
        let determinant = self.determinant();
        let hadamard_bound:f64 = self.rows.iter().map(norm).product();
        if !determinant.is_finite() || determinant.abs() <= eps*hadamard_bound {
            return Err(MatrixError::SingularError { determinant })
        }
        let mut inverse = Self::default();
        for i in 0..3 {
            for j in 0..3 {
                // transposed cofactor
                inverse.rows[i][j] = self.cofactor_unchecked(j, i)/determinant;
            }
        }
        if inverse.rows.iter().flatten().any(|n| !n.is_finite()) {
            return Err(MatrixError::SingularError { determinant })
        }
        Ok(inverse)
    }

    pub fn dot(&self,rhs:&Self) -> Self {
        let mut product = Self::default();
        for i in 0..3 {
            for j in 0..3 {
                product.rows[i][j] = (0..3).map(|k| self.rows[i][k]*rhs.rows[k][j]).sum();
            }
        }
        product
    }

    pub fn mul_vector(&self,v:&Vector3) -> Vector3 {
        let mut out = [0.0;3];
        for (o,row) in out.iter_mut().zip(self.rows.iter()) {
            *o = row.iter().zip(v.iter()).map(|(a,b)| a*b).sum();
        }
        out
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::default();
        for i in 0..3 {
            for j in 0..3 {
                t.rows[j][i] = self.rows[i][j];
            }
        }
        t
    }
}
