use std::f32::consts::{PI, TAU};

use bevy::{log::warn, math::Vec2};

const EPSILON: f32 = 1e-6;

/// Weights of a 1D blend tree for `parameter`. `thresholds` must be non-decreasing.
///
/// Outside the threshold range the closest end motion gets all the weight. Inside, the first
/// pair of thresholds bracketing the parameter is interpolated; a pair of equal thresholds
/// gives all the weight to the first motion of the pair.
pub fn compute_blend_tree_1d_weights(thresholds: &[f32], parameter: f32) -> Vec<f32> {
    let mut weights = vec![0.; thresholds.len()];
    let (Some(first), Some(last)) = (thresholds.first(), thresholds.last()) else {
        return weights;
    };

    if parameter.is_nan() {
        warn!("1D blend parameter is NaN, using the first motion");
        weights[0] = 1.;
    } else if parameter <= *first {
        weights[0] = 1.;
    } else if parameter >= *last {
        weights[thresholds.len() - 1] = 1.;
    } else if let Some(index) = thresholds
        .windows(2)
        .position(|pair| pair[0] <= parameter && parameter <= pair[1])
    {
        let width = thresholds[index + 1] - thresholds[index];
        if width <= 0. {
            weights[index] = 1.;
        } else {
            let t = (parameter - thresholds[index]) / width;
            weights[index] = 1. - t;
            weights[index + 1] = t;
        }
    }
    weights
}

/// Weights of a 2D simple directional blend tree for `parameter`.
///
/// A motion at the origin is the center motion. The two directional motions angularly closest
/// to the parameter on either side span a triangle with the origin; the parameter's
/// barycentric coordinates give their weights (negative ones clipped, the pair renormalized
/// outside the triangle) and what is left goes to the center motion, or to every motion
/// equally without one. When those neighbours are a half turn or more apart, or there is a
/// single directional motion, the parameter is projected onto the closest motion direction.
/// The weights always sum to one.
pub fn compute_blend_tree_2d_simple_directional_weights(
    positions: &[Vec2],
    parameter: Vec2,
) -> Vec<f32> {
    let count = positions.len();
    let mut weights = vec![0.; count];
    if count == 0 {
        return weights;
    }

    let center = positions
        .iter()
        .position(|position| position.length_squared() <= EPSILON * EPSILON);
    let parameter = if parameter.is_finite() {
        parameter
    } else {
        warn!("2D blend parameter {parameter} is not finite, using the origin");
        Vec2::ZERO
    };

    if parameter.length_squared() <= EPSILON * EPSILON {
        match center {
            Some(center) => weights[center] = 1.,
            None => weights.fill(1. / count as f32),
        }
        return weights;
    }

    let directional: Vec<usize> = (0..count).filter(|i| Some(*i) != center).collect();
    let assigned = match directional.as_slice() {
        [] => 0.,
        [single] => project(positions, *single, parameter, &mut weights),
        _ => {
            if let Some(hit) = directional
                .iter()
                .copied()
                .find(|i| same_direction(positions[*i], parameter))
            {
                project(positions, hit, parameter, &mut weights)
            } else {
                interpolate_neighbours(positions, &directional, parameter, &mut weights)
            }
        }
    };

    let residual = (1. - assigned).max(0.);
    match center {
        Some(center) => weights[center] += residual,
        None => {
            let share = residual / count as f32;
            weights.iter_mut().for_each(|weight| *weight += share);
        }
    }
    weights
}

fn same_direction(direction: Vec2, parameter: Vec2) -> bool {
    direction.perp_dot(parameter).abs() <= EPSILON * direction.length() * parameter.length()
        && direction.dot(parameter) > 0.
}

/// Gives `motion` the parameter's projection onto its position, in `[0, 1]`.
fn project(positions: &[Vec2], motion: usize, parameter: Vec2, weights: &mut [f32]) -> f32 {
    let direction = positions[motion];
    let weight = (parameter.dot(direction) / direction.length_squared()).clamp(0., 1.);
    weights[motion] = weight;
    weight
}

fn interpolate_neighbours(
    positions: &[Vec2],
    directional: &[usize],
    parameter: Vec2,
    weights: &mut [f32],
) -> f32 {
    let parameter_angle = parameter.to_angle();
    let offset = |motion: usize| (positions[motion].to_angle() - parameter_angle).rem_euclid(TAU);

    // Closest motion counter-clockwise and closest motion clockwise of the parameter
    let mut ccw = (directional[0], offset(directional[0]));
    let mut cw = ccw;
    for motion in directional.iter().copied().skip(1) {
        let angle = offset(motion);
        if angle < ccw.1 {
            ccw = (motion, angle);
        }
        if angle > cw.1 {
            cw = (motion, angle);
        }
    }

    let wedge = ccw.1 + (TAU - cw.1);
    if wedge >= PI - EPSILON {
        let closest = directional
            .iter()
            .copied()
            .fold(None, |best: Option<(usize, f32)>, motion| {
                let cosine = positions[motion].normalize().dot(parameter.normalize());
                match best {
                    Some((_, best_cosine)) if cosine <= best_cosine => best,
                    _ => Some((motion, cosine)),
                }
            });
        return match closest {
            Some((motion, _)) => project(positions, motion, parameter, weights),
            None => 0.,
        };
    }

    let a = positions[ccw.0];
    let b = positions[cw.0];
    let determinant = a.x * b.y - a.y * b.x;
    if determinant.abs() <= EPSILON {
        return 0.;
    }
    let mut weight_a = ((parameter.x * b.y - parameter.y * b.x) / determinant).max(0.);
    let mut weight_b = ((a.x * parameter.y - a.y * parameter.x) / determinant).max(0.);
    let total = weight_a + weight_b;
    if total > 1. {
        weight_a /= total;
        weight_b /= total;
    }
    weights[ccw.0] = weight_a;
    weights[cw.0] = weight_b;
    weight_a + weight_b
}

/// Time a blend takes to complete: every motion's duration at its speed, weighted.
pub fn blended_duration(weights: &[f32], motions: impl IntoIterator<Item = (f32, f32)>) -> f32 {
    weights
        .iter()
        .zip(motions)
        .map(|(weight, (duration, speed))| weight * duration / speed)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_weights(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (actual_weight, expected_weight) in actual.iter().zip(expected) {
            assert!(
                (actual_weight - expected_weight).abs() < 1e-5,
                "{actual:?} != {expected:?}"
            );
        }
    }

    const THRESHOLDS: [f32; 5] = [0.2, 0.4, 0.6, 0.8, 1.0];

    #[test]
    fn one_dimensional_boundaries() {
        assert_weights(
            &compute_blend_tree_1d_weights(&THRESHOLDS, 0.2),
            &[1., 0., 0., 0., 0.],
        );
        assert_weights(
            &compute_blend_tree_1d_weights(&THRESHOLDS, -3.),
            &[1., 0., 0., 0., 0.],
        );
        assert_weights(
            &compute_blend_tree_1d_weights(&THRESHOLDS, 1.0),
            &[0., 0., 0., 0., 1.],
        );
        assert_weights(
            &compute_blend_tree_1d_weights(&THRESHOLDS, 7.),
            &[0., 0., 0., 0., 1.],
        );
        assert_weights(
            &compute_blend_tree_1d_weights(&THRESHOLDS, 0.3),
            &[0.5, 0.5, 0., 0., 0.],
        );
        assert_weights(
            &compute_blend_tree_1d_weights(&THRESHOLDS, 0.75),
            &[0., 0., 0.25, 0.75, 0.],
        );
    }

    #[test]
    fn one_dimensional_ties_and_nan() {
        // On a threshold shared by two motions, the first bracketing pair wins
        assert_weights(
            &compute_blend_tree_1d_weights(&[0., 0.5, 0.5, 1.], 0.5),
            &[0., 1., 0., 0.],
        );
        assert_weights(
            &compute_blend_tree_1d_weights(&THRESHOLDS, f32::NAN),
            &[1., 0., 0., 0., 0.],
        );
        assert!(compute_blend_tree_1d_weights(&[], 0.5).is_empty());
    }

    const CROSS: [Vec2; 4] = [
        Vec2::new(-2., 0.),
        Vec2::new(2., 0.),
        Vec2::new(0., 2.),
        Vec2::new(0., -2.),
    ];

    #[test]
    fn two_dimensional_designated_directions() {
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&CROSS, Vec2::new(-2., 0.)),
            &[1., 0., 0., 0.],
        );
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&CROSS, Vec2::new(0., -2.)),
            &[0., 0., 0., 1.],
        );
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&CROSS, Vec2::ZERO),
            &[0.25, 0.25, 0.25, 0.25],
        );
    }

    #[test]
    fn two_dimensional_between_directions() {
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&CROSS, Vec2::new(1., 1.)),
            &[0., 0.5, 0.5, 0.],
        );
        // Inside the triangle the residual is shared by every motion
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&CROSS, Vec2::new(0.5, 0.5)),
            &[0.125, 0.375, 0.375, 0.125],
        );
        // Outside the hull the pair is renormalized
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&CROSS, Vec2::new(4., 4.)),
            &[0., 0.5, 0.5, 0.],
        );
    }

    #[test]
    fn two_dimensional_center_takes_residual() {
        let positions = [Vec2::ZERO, Vec2::new(1., 0.), Vec2::new(0., 1.)];
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&positions, Vec2::ZERO),
            &[1., 0., 0.],
        );
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&positions, Vec2::new(0.5, 0.)),
            &[0.5, 0.5, 0.],
        );
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&positions, Vec2::new(0.25, 0.25)),
            &[0.5, 0.25, 0.25],
        );
    }

    #[test]
    fn two_dimensional_wide_wedge_projects() {
        let positions = [Vec2::ZERO, Vec2::new(1., 0.), Vec2::new(-1., 0.)];
        // Neighbours are a half turn apart: project onto the closest direction
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&positions, Vec2::new(0.5, 0.5)),
            &[0.5, 0.5, 0.],
        );
        let single = [Vec2::ZERO, Vec2::new(0., 1.)];
        assert_weights(
            &compute_blend_tree_2d_simple_directional_weights(&single, Vec2::new(0., -1.)),
            &[1., 0.],
        );
    }

    #[test]
    fn weights_sum_to_one() {
        for angle in 0..32 {
            let parameter = Vec2::from_angle(angle as f32 * TAU / 32.) * (0.3 + angle as f32 * 0.1);
            let sum: f32 = compute_blend_tree_2d_simple_directional_weights(&CROSS, parameter)
                .iter()
                .sum();
            assert!((sum - 1.).abs() < 1e-5);
        }
    }

    #[test]
    fn duration_is_weighted_by_speed() {
        let duration = blended_duration(&[0.25, 0.75], [(2., 1.), (1., 0.5)]);
        assert!((duration - 2.).abs() < 1e-6);
    }
}
