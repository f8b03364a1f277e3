//! Adjoint coordinate-transform calculator.
//!
//! Maps a step's local twist into the world frame given a hand pose and
//! the object's rigid-body transforms: `V_world = Ad(T_ref) * V_local`,
//! where `T_ref` depends on the step's frame mode.

use nalgebra::{Matrix3, Matrix4, Matrix6, Vector3, Vector6};
use serde::Deserialize;
use thiserror::Error;

use crate::dataset::{DatasetError, ObjectLibrary};
use crate::types::{Frame, Plan, PointValue, Vec6};

#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Invalid model data for '{object}': {message}")]
    InvalidModelData { object: String, message: String },
}

/// Rigid-body transforms an object's `model_data1.json` provides. Each
/// matrix list is indexed by point id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelData {
    #[serde(default)]
    contact_matrix: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    functional_matrix: Vec<Vec<Vec<f64>>>,
}

impl ModelData {
    /// Hand-to-contact transform for the given point id.
    pub fn contact(&self, point_id: usize) -> Option<Matrix4<f64>> {
        self.contact_matrix.get(point_id).and_then(|m| matrix4(m))
    }

    /// Contact-to-functional transform for the given point id.
    pub fn functional(&self, point_id: usize) -> Option<Matrix4<f64>> {
        self.functional_matrix.get(point_id).and_then(|m| matrix4(m))
    }
}

fn matrix4(rows: &[Vec<f64>]) -> Option<Matrix4<f64>> {
    if rows.len() != 4 || rows.iter().any(|r| r.len() != 4) {
        return None;
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Some(Matrix4::from_row_slice(&flat))
}

/// Skew-symmetric (hat) matrix of a 3-vector.
pub fn skew(p: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -p.z, p.y, //
        p.z, 0.0, -p.x, //
        -p.y, p.x, 0.0,
    )
}

/// Adjoint of a homogeneous transform:
/// `[[R, p^ R], [0, R]]` acting on (linear, angular) twists.
pub fn adjoint(t: &Matrix4<f64>) -> Matrix6<f64> {
    let r = t.fixed_view::<3, 3>(0, 0).into_owned();
    let p: Vector3<f64> = t.fixed_view::<3, 1>(0, 3).into_owned();
    let mut adj = Matrix6::zeros();
    adj.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
    adj.fixed_view_mut::<3, 3>(0, 3).copy_from(&(skew(&p) * r));
    adj.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
    adj
}

/// Reference transform for a step, by frame mode. Objects without model
/// data are treated as rigidly attached to the hand.
pub fn reference_transform(
    frame: Frame,
    t_world_hand: &Matrix4<f64>,
    model: Option<&ModelData>,
    point_id: usize,
) -> Matrix4<f64> {
    let model = match model {
        Some(model) => model,
        None => return *t_world_hand,
    };
    let t_hand_contact = model.contact(point_id).unwrap_or_else(Matrix4::identity);
    match frame {
        Frame::Contact => t_world_hand * t_hand_contact,
        Frame::Functional => {
            let t_contact_functional =
                model.functional(point_id).unwrap_or_else(Matrix4::identity);
            t_world_hand * t_hand_contact * t_contact_functional
        }
        Frame::World => {
            // Identity rotation, but keep the contact position so the
            // moment arm is correct.
            let mut t = Matrix4::identity();
            let contact = t_world_hand * t_hand_contact;
            t.fixed_view_mut::<3, 1>(0, 3)
                .copy_from(&contact.fixed_view::<3, 1>(0, 3).into_owned());
            t
        }
    }
}

/// Map a local twist through the reference transform into world frame.
pub fn world_twist(v_local: &Vec6, t_ref: &Matrix4<f64>) -> Vector6<f64> {
    adjoint(t_ref) * Vector6::from_row_slice(v_local)
}

/// One step's world-frame motion, or `None` when the step carries no
/// usable twist data.
#[derive(Debug, Clone)]
pub struct StepWorldTwist {
    pub index: usize,
    pub subtask: Option<String>,
    pub frame: Option<Frame>,
    pub twist: Option<Vector6<f64>>,
}

impl StepWorldTwist {
    pub fn linear(&self) -> Option<Vector3<f64>> {
        self.twist.map(|t| t.fixed_rows::<3>(0).into_owned())
    }

    pub fn angular(&self) -> Option<Vector3<f64>> {
        self.twist.map(|t| t.fixed_rows::<3>(3).into_owned())
    }
}

/// Compute world-frame twists for every step of a validated plan.
pub fn analyze_plan(
    plan: &Plan,
    t_world_hand: &Matrix4<f64>,
    library: &ObjectLibrary,
) -> Result<Vec<StepWorldTwist>, TransformError> {
    let mut out = Vec::with_capacity(plan.sequence.len());
    for (index, step) in plan.sequence.iter().enumerate() {
        let (frame, v, actor) = (step.frame, step.v, step.actor_obj.as_deref());
        let twist = match (frame, v, actor) {
            (Some(frame), Some(v), Some(actor)) => {
                let model = match library.model_data(actor)? {
                    Some(value) => Some(serde_json::from_value::<ModelData>(value).map_err(
                        |e| TransformError::InvalidModelData {
                            object: actor.to_string(),
                            message: e.to_string(),
                        },
                    )?),
                    None => None,
                };
                let point_id = step
                    .actor_point
                    .as_ref()
                    .and_then(PointValue::as_id)
                    .and_then(|id| usize::try_from(id).ok())
                    .unwrap_or(0);
                let t_ref = reference_transform(frame, t_world_hand, model.as_ref(), point_id);
                Some(world_twist(&v, &t_ref))
            }
            _ => None,
        };
        out.push(StepWorldTwist {
            index,
            subtask: step.subtask.clone(),
            frame,
            twist,
        });
    }
    Ok(out)
}
