use glam::{Vec3, Vec3Swizzles, Vec4};
use stormworks_files::common::types::SwColor;

/// Editor space is RH with Z up, the game is Y up. The two only differ by swapping Y and Z.
#[inline]
pub fn editor_to_game(source: Vec3) -> Vec3 {
    source.xzy()
}

#[inline]
pub fn game_to_editor(source: Vec3) -> Vec3 {
    source.xzy()
}

/// Linear editor colors are quantized to bytes, out of range channels are clamped.
#[inline]
pub fn editor_to_game_color(source: Vec4) -> SwColor {
    let channel = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    SwColor::new(channel(source.x), channel(source.y), channel(source.z), channel(source.w))
}

#[inline]
pub fn game_to_editor_color(source: SwColor) -> Vec4 {
    Vec4::new(source.r as f32, source.g as f32, source.b as f32, source.a as f32) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_swap_both_ways() {
        let editor = Vec3::new(1.0, 2.0, 3.0);
        let game = editor_to_game(editor);
        assert_eq!(game, Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(game_to_editor(game), editor);
    }

    #[test]
    fn colors_are_rounded_and_clamped() {
        assert_eq!(
            editor_to_game_color(Vec4::new(0.6, 1.5, -0.2, 1.0)),
            SwColor::new(153, 255, 0, 255)
        );
        let color = SwColor::new(160, 160, 199, 128);
        assert_eq!(editor_to_game_color(game_to_editor_color(color)), color);
    }
}
