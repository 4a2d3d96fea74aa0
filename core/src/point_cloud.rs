use nalgebra::{Matrix3xX, Point3, RealField, Scalar, Vector3};

/// Unordered 3D points with optional per-point colors and normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud<T: Scalar = f64> {
    pub points: Vec<Point3<T>>,
    pub colors: Option<Vec<Point3<T>>>,
    pub normals: Option<Vec<Vector3<T>>>,
}

impl<T: Scalar> PointCloud<T> {
    pub fn new(points: Vec<Point3<T>>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    pub fn with_colors(mut self, colors: Vec<Point3<T>>) -> crate::Result<Self> {
        if colors.len() == self.points.len() {
            self.colors = Some(colors);
            Ok(self)
        } else {
            Err(crate::Error::InvalidInput(format!(
                "Color count {} does not match point count {}",
                colors.len(),
                self.points.len()
            )))
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vector3<T>>) -> crate::Result<Self> {
        if normals.len() == self.points.len() {
            self.normals = Some(normals);
            Ok(self)
        } else {
            Err(crate::Error::InvalidInput(format!(
                "Normal count {} does not match point count {}",
                normals.len(),
                self.points.len()
            )))
        }
    }

    /// Subset in the order given by `indices`; attributes follow their points.
    pub fn select(&self, indices: &[usize]) -> Self {
        let pick = |v: &Vec<Point3<T>>| indices.iter().map(|&i| v[i].clone()).collect();
        Self {
            points: pick(&self.points),
            colors: self.colors.as_ref().map(pick),
            normals: self
                .normals
                .as_ref()
                .map(|n| indices.iter().map(|&i| n[i].clone()).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<T: Scalar + RealField + Copy> PointCloud<T> {
    /// Points as columns of a 3 x N matrix.
    pub fn to_matrix(&self) -> Matrix3xX<T> {
        Matrix3xX::from_fn(self.points.len(), |r, c| self.points[c][r])
    }

    pub fn from_matrix(m: &Matrix3xX<T>) -> Self {
        Self::new(
            m.column_iter()
                .map(|c| Point3::new(c[0], c[1], c[2]))
                .collect(),
        )
    }
}
