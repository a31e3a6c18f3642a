//! GLSL sources for the two drawers.
//!
//! Both programs share one vertex stage. Texture coordinates go through `uTexMatrix` so the
//! streaming texture's orientation fix applies to either drawer.

pub const ATTR_POSITION: &str = "aPosition";
pub const ATTR_TEX_COORD: &str = "aTexCoord";

pub const U_MVP: &str = "uMVPMatrix";
pub const U_TEX_MATRIX: &str = "uTexMatrix";
pub const U_TEXTURE: &str = "sTexture";

pub const U_SEPIA: &str = "SepiaValue";
pub const U_NOISE: &str = "NoiseValue";
pub const U_SCRATCH: &str = "ScratchValue";
pub const U_INNER_VIGNETTING: &str = "InnerVignetting";
pub const U_OUTER_VIGNETTING: &str = "OuterVignetting";
pub const U_RANDOM: &str = "RandomValue";
pub const U_TIME_LAPSE: &str = "TimeLapse";

pub const COMMON_ATTRIBUTES: [&str; 2] = [ATTR_POSITION, ATTR_TEX_COORD];
pub const COMMON_UNIFORMS: [&str; 3] = [U_MVP, U_TEX_MATRIX, U_TEXTURE];
pub const STYLIZED_UNIFORMS: [&str; 7] = [
    U_SEPIA,
    U_NOISE,
    U_SCRATCH,
    U_INNER_VIGNETTING,
    U_OUTER_VIGNETTING,
    U_RANDOM,
    U_TIME_LAPSE,
];

pub const QUAD_VERT: &str = r#"#version 330 core
uniform mat4 uMVPMatrix;
uniform mat4 uTexMatrix;
in vec4 aPosition;
in vec4 aTexCoord;
out vec2 vTextureCoord;
void main() {
    gl_Position = uMVPMatrix * aPosition;
    vTextureCoord = (uTexMatrix * aTexCoord).xy;
}
"#;

pub const PASS_THROUGH_FRAG: &str = r#"#version 330 core
in vec2 vTextureCoord;
out vec4 FragColor;
uniform sampler2D sTexture;
void main() {
    FragColor = texture(sTexture, vTextureCoord);
}
"#;

// Every term is a mix/multiply toward its input, so all-zero parameters leave the sample as is.
pub const STYLIZED_FRAG: &str = r#"#version 330 core
in vec2 vTextureCoord;
out vec4 FragColor;

uniform sampler2D sTexture;
uniform float SepiaValue;
uniform float NoiseValue;
uniform float ScratchValue;
uniform float InnerVignetting;
uniform float OuterVignetting;
uniform float RandomValue;
uniform float TimeLapse;

float hash(vec2 p) {
    p = fract(p * vec2(443.897, 441.423));
    p += dot(p, p.yx + 19.19);
    return fract((p.x + p.y) * p.x);
}

vec3 overlay(vec3 src, vec3 dst) {
    return vec3(
        dst.x <= 0.5 ? 2.0 * src.x * dst.x : 1.0 - 2.0 * (1.0 - dst.x) * (1.0 - src.x),
        dst.y <= 0.5 ? 2.0 * src.y * dst.y : 1.0 - 2.0 * (1.0 - dst.y) * (1.0 - src.y),
        dst.z <= 0.5 ? 2.0 * src.z * dst.z : 1.0 - 2.0 * (1.0 - dst.z) * (1.0 - src.z));
}

void main() {
    vec4 texel = texture(sTexture, vTextureCoord);
    vec3 colour = texel.rgb;

    float gray = dot(colour, vec3(0.299, 0.587, 0.114));
    vec3 sepia = overlay(vec3(112.0 / 255.0, 66.0 / 255.0, 20.0 / 255.0), vec3(gray));
    colour = mix(colour, sepia, SepiaValue);

    float grain = hash(vTextureCoord * 1024.0 + TimeLapse) - 0.5;
    colour += grain * NoiseValue * 0.25;

    colour *= 1.0 - NoiseValue * 0.1 * RandomValue;

    if (RandomValue < ScratchValue) {
        float x = fract(RandomValue * 7.13 + TimeLapse * 0.001);
        float line = abs(vTextureCoord.x - x);
        float streak = 1.0 - smoothstep(0.0, 0.0015, line);
        float fade = hash(vec2(floor(vTextureCoord.y * 64.0), TimeLapse));
        colour = mix(colour, vec3(0.9), streak * fade * ScratchValue);
    }

    float d = distance(vec2(0.5), vTextureCoord) * 1.414;
    float band = max(OuterVignetting - InnerVignetting, 0.0001);
    colour *= clamp((OuterVignetting - d) / band, 0.0, 1.0);

    FragColor = vec4(clamp(colour, 0.0, 1.0), texel.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use oldfilm_core::{EffectParameters, FrameJitter, StylizedUniforms};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn fract(x: f32) -> f32 {
        x - x.floor()
    }

    fn mix(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
        let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    fn hash(p: [f32; 2]) -> f32 {
        let mut p = [fract(p[0] * 443.897), fract(p[1] * 441.423)];
        let d = p[0] * (p[1] + 19.19) + p[1] * (p[0] + 19.19);
        p[0] += d;
        p[1] += d;
        fract((p[0] + p[1]) * p[0])
    }

    fn overlay(src: f32, dst: f32) -> f32 {
        if dst <= 0.5 {
            2.0 * src * dst
        } else {
            1.0 - 2.0 * (1.0 - dst) * (1.0 - src)
        }
    }

    /// CPU rendition of `STYLIZED_FRAG` for one texel.
    fn shade(rgb: [f32; 3], uv: [f32; 2], u: &StylizedUniforms) -> [f32; 3] {
        const TONE: [f32; 3] = [112.0 / 255.0, 66.0 / 255.0, 20.0 / 255.0];
        let gray = 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2];
        let grain = hash([uv[0] * 1024.0 + u.time_lapse, uv[1] * 1024.0 + u.time_lapse]) - 0.5;
        let d = ((uv[0] - 0.5).powi(2) + (uv[1] - 0.5).powi(2)).sqrt() * 1.414;
        let band = (u.outer_vignetting - u.inner_vignetting).max(0.0001);
        let vignette = ((u.outer_vignetting - d) / band).clamp(0.0, 1.0);

        let mut out = [0.0; 3];
        for (i, c) in out.iter_mut().enumerate() {
            let mut v = mix(rgb[i], overlay(TONE[i], gray), u.sepia);
            v += grain * u.noise * 0.25;
            v *= 1.0 - u.noise * 0.1 * u.random;
            if u.random < u.scratch {
                let x = fract(u.random * 7.13 + u.time_lapse * 0.001);
                let streak = 1.0 - smoothstep(0.0, 0.0015, (uv[0] - x).abs());
                let fade = hash([(uv[1] * 64.0).floor(), u.time_lapse]);
                v = mix(v, 0.9, streak * fade * u.scratch);
            }
            *c = (v * vignette).clamp(0.0, 1.0);
        }
        out
    }

    fn texels(rng: &mut StdRng) -> Vec<([f32; 3], [f32; 2])> {
        let mut out = Vec::new();
        for y in 0..=16 {
            for x in 0..=16 {
                let rgb = [rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>()];
                out.push((rgb, [x as f32 / 16.0, y as f32 / 16.0]));
            }
        }
        out
    }

    #[test]
    fn mirrored_terms_match_the_shader_source() {
        for line in [
            "colour = mix(colour, sepia, SepiaValue);",
            "colour += grain * NoiseValue * 0.25;",
            "colour *= 1.0 - NoiseValue * 0.1 * RandomValue;",
            "if (RandomValue < ScratchValue) {",
            "float d = distance(vec2(0.5), vTextureCoord) * 1.414;",
            "colour *= clamp((OuterVignetting - d) / band, 0.0, 1.0);",
            "FragColor = vec4(clamp(colour, 0.0, 1.0), texel.a);",
        ] {
            assert!(STYLIZED_FRAG.contains(line), "{line}");
        }
    }

    #[test]
    fn zero_parameters_leave_every_texel_unchanged() {
        let mut rng = StdRng::seed_from_u64(0x5e_91a);
        for _ in 0..32 {
            let u = StylizedUniforms::derive(&EffectParameters::IDENTITY, FrameJitter::sample(&mut rng));
            for (rgb, uv) in texels(&mut rng) {
                assert_eq!(shade(rgb, uv, &u), rgb, "uv {uv:?} uniforms {u:?}");
            }
        }
    }

    #[test]
    fn default_parameters_change_the_image() {
        let mut rng = StdRng::seed_from_u64(3);
        let u = StylizedUniforms::derive(&EffectParameters::default(), FrameJitter::sample(&mut rng));
        let changed = texels(&mut rng)
            .into_iter()
            .filter(|&(rgb, uv)| shade(rgb, uv, &u) != rgb)
            .count();
        assert!(changed > 0);
    }

    #[test]
    fn sources_declare_every_required_name() {
        for name in COMMON_ATTRIBUTES {
            assert!(QUAD_VERT.contains(name), "{name}");
        }
        assert!(QUAD_VERT.contains(U_MVP) && QUAD_VERT.contains(U_TEX_MATRIX));
        assert!(PASS_THROUGH_FRAG.contains(U_TEXTURE));
        for name in STYLIZED_UNIFORMS.iter().chain([&U_TEXTURE]) {
            assert!(
                STYLIZED_FRAG.contains(&format!("uniform float {name}"))
                    || STYLIZED_FRAG.contains(&format!("uniform sampler2D {name}")),
                "{name}"
            );
        }
    }
}
