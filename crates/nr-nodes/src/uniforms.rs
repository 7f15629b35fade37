use bytemuck::{Pod, Zeroable};

/// Matches the `Uniforms` struct declared in `shaders/common.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct NodeUniforms {
    pub time: f32,
    pub _pad0: f32,
    pub resolution: [f32; 2],
    pub params: [[f32; 4]; 4],
}

impl NodeUniforms {
    pub fn new(time: f32, width: u32, height: u32, params: &[f32]) -> Self {
        let mut packed = [[0.0f32; 4]; 4];
        for (i, &v) in params.iter().take(16).enumerate() {
            packed[i / 4][i % 4] = v;
        }
        NodeUniforms {
            time,
            _pad0: 0.0,
            resolution: [width as f32, height as f32],
            params: packed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_packed_in_order() {
        let u = NodeUniforms::new(1.0, 1920, 1080, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(u.params[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(u.params[1][0], 5.0);
    }

    #[test]
    fn extra_params_beyond_16_are_dropped_not_panicking() {
        let many: Vec<f32> = (0..30).map(|v| v as f32).collect();
        let u = NodeUniforms::new(0.0, 100, 100, &many);
        assert_eq!(u.params[3], [12.0, 13.0, 14.0, 15.0]);
    }
}
