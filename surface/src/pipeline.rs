//! Per-frame orchestration of the reconstruction stages.

use crate::predictor::NormalPredictor;
use nalgebra::Matrix3xX;
use touch3d_calib3d::CameraProjector;
use touch3d_core::{
    BackgroundMask, ColorImage, DepthMap, Error, NormalMap, PointCloud, Result, SensorConfig,
    SensorMode,
};
use touch3d_imgproc::{normals_to_gradient, preprocess_normals};
use touch3d_point_cloud::remove_statistical_outliers;
use touch3d_scientific::{integrate_gradient, remove_background_depth, IntegrationParams, SineTransform};

/// Stages a frame passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconstructionStage {
    RawColor,
    NormalPredicted,
    NormalPreprocessed,
    GradientComputed,
    DepthSolved,
    DepthMasked,
    PointsProjected,
    PointsFiltered,
    Done,
}

impl ReconstructionStage {
    pub const ALL: [ReconstructionStage; 9] = [
        Self::RawColor,
        Self::NormalPredicted,
        Self::NormalPreprocessed,
        Self::GradientComputed,
        Self::DepthSolved,
        Self::DepthMasked,
        Self::PointsProjected,
        Self::PointsFiltered,
        Self::Done,
    ];
}

/// Everything produced for one frame.
#[derive(Debug, Clone)]
pub struct ReconstructionResult {
    /// World-space points of pixels with positive depth that survived
    /// outlier removal.
    pub points_3d: PointCloud,
    pub color: ColorImage,
    /// Raw predicted normal map, channels in `[0, 1]`.
    pub normal: NormalMap,
    pub depth: DepthMap,
    /// Row-major pixel index of every point in `points_3d`.
    pub kept_indices: Vec<usize>,
    stages: Vec<ReconstructionStage>,
}

impl ReconstructionResult {
    /// Predicted normals as H x W x 3, row-major.
    pub fn normal_hwc(&self) -> Vec<[f64; 3]> {
        self.normal.to_hwc()
    }

    /// Points as a 3 x N matrix.
    pub fn points_matrix(&self) -> Matrix3xX<f64> {
        self.points_3d.to_matrix()
    }

    pub fn stages(&self) -> &[ReconstructionStage] {
        &self.stages
    }
}

/// Color frame to filtered 3D surface points for one sensor.
///
/// Holds only read-only state, so one pipeline can serve frames from
/// several threads when the predictor is `Sync`.
pub struct ReconstructionPipeline<P> {
    config: SensorConfig,
    projector: CameraProjector,
    integration: IntegrationParams,
    predictor: P,
}

impl<P: NormalPredictor> ReconstructionPipeline<P> {
    /// Validates `config` and precomputes the camera inverses.
    pub fn new(config: SensorConfig, predictor: P) -> Result<Self> {
        config.validate()?;
        let projector = CameraProjector::from_config(&config)?;
        // background reset runs as its own stage
        let integration = IntegrationParams::default()
            .with_max_depth(config.max_depth)
            .with_remove_background_depth(false);
        Ok(Self {
            config,
            projector,
            integration,
            predictor,
        })
    }

    /// Select the sine transform used by the Poisson solve.
    pub fn with_transform(mut self, transform: SineTransform) -> Self {
        self.integration = self.integration.with_transform(transform);
        self
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn projector(&self) -> &CameraProjector {
        &self.projector
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Reconstruct one frame.
    ///
    /// In simulation mode `depth_gt` is required and the background mask is
    /// derived from it (`depth_gt > gel_depth`); otherwise `bg_mask` is used
    /// as given.
    pub fn reconstruct(
        &self,
        color: &ColorImage,
        depth_gt: Option<&DepthMap>,
        bg_mask: Option<&BackgroundMask>,
    ) -> Result<ReconstructionResult> {
        let derived;
        let mask = match self.config.mode {
            SensorMode::Simulation => {
                let depth_gt = depth_gt.ok_or_else(|| {
                    Error::configuration("simulation mode requires ground-truth depth")
                })?;
                if bg_mask.is_some() {
                    tracing::warn!("external background mask ignored in simulation mode");
                }
                derived = BackgroundMask::from_depth_threshold(depth_gt, self.config.gel_depth);
                Some(&derived)
            }
            SensorMode::Real => bg_mask,
        };

        let mut stages = vec![ReconstructionStage::RawColor];
        let (h, w) = (color.height() as usize, color.width() as usize);

        let normal = self.predictor.predict_normal(color)?;
        if (normal.height(), normal.width()) != (h, w) {
            return Err(Error::InvalidShape(format!(
                "predicted normal map is {}x{}, color frame is {h}x{w}",
                normal.height(),
                normal.width()
            )));
        }
        stages.push(ReconstructionStage::NormalPredicted);

        let unit = preprocess_normals(&normal, mask)?;
        stages.push(ReconstructionStage::NormalPreprocessed);

        let grad = normals_to_gradient(&unit, self.config.gel_width, self.config.gel_height, mask)?;
        stages.push(ReconstructionStage::GradientComputed);

        let mut depth = integrate_gradient(&grad, None, mask, &self.integration)?;
        stages.push(ReconstructionStage::DepthSolved);

        if mask.is_some() && self.config.remove_background_depth {
            remove_background_depth(&mut depth.data, self.config.max_depth);
        }
        stages.push(ReconstructionStage::DepthMasked);

        let (points, pixel_indices) = self.projector.depth_to_valid_points(&depth)?;
        stages.push(ReconstructionStage::PointsProjected);

        let params = self.config.outlier;
        let (points_3d, kept) = remove_statistical_outliers(&points, params.k, params.std_ratio);
        let kept_indices: Vec<usize> = kept.iter().map(|&i| pixel_indices[i]).collect();
        stages.push(ReconstructionStage::PointsFiltered);

        tracing::debug!(
            height = h,
            width = w,
            projected = points.len(),
            kept = points_3d.len(),
            "frame reconstructed"
        );
        stages.push(ReconstructionStage::Done);

        Ok(ReconstructionResult {
            points_3d,
            color: color.clone(),
            normal,
            depth,
            kept_indices,
            stages,
        })
    }
}
