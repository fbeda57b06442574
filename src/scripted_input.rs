use arena_core::InputState;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize)]
struct ScriptedInputFile {
    steps: Vec<ScriptedStep>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
struct ScriptedStep {
    duration: f32,
    #[serde(default)]
    move_x: f32,
    #[serde(default)]
    move_y: f32,
    #[serde(default)]
    sprint: bool,
}

impl ScriptedStep {
    const fn new(duration: f32, move_x: f32, move_y: f32, sprint: bool) -> Self {
        Self {
            duration,
            move_x,
            move_y,
            sprint,
        }
    }

    fn into_input(self) -> InputState {
        InputState::from_axes(self.move_x, self.move_y, self.sprint)
    }
}

/// Route used when no script is supplied: a lap around the arena that
/// presses into walls, slides, and sprints through the broken gap.
const DEFAULT_ROUTE: [ScriptedStep; 7] = [
    ScriptedStep::new(1.0, 1.0, 0.0, false),
    ScriptedStep::new(1.5, 1.0, 1.0, false),
    ScriptedStep::new(1.0, 0.0, -1.0, true),
    ScriptedStep::new(0.5, 0.0, 0.0, false),
    ScriptedStep::new(1.5, -1.0, 1.0, false),
    ScriptedStep::new(2.0, 0.0, 1.0, true),
    ScriptedStep::new(0.5, 0.0, 0.0, false),
];

pub struct ScriptedInputPlayer {
    steps: Vec<ScriptedStep>,
    index: usize,
    time_in_step: f32,
    finished: bool,
}

impl ScriptedInputPlayer {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let file: ScriptedInputFile = serde_json::from_str(&contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("scripted input file contains no steps");
        }
        Ok(Self::from_steps(file.steps))
    }

    pub fn default_route() -> Self {
        Self::from_steps(DEFAULT_ROUTE.to_vec())
    }

    fn from_steps(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps,
            index: 0,
            time_in_step: 0.0,
            finished: false,
        }
    }

    /// Input for the next `dt` seconds; idle once the last step has elapsed.
    pub fn advance(&mut self, dt: f32) -> InputState {
        if self.finished || self.steps.is_empty() {
            return InputState::IDLE;
        }

        self.time_in_step += dt;
        while self.time_in_step >= self.steps[self.index].duration {
            self.time_in_step -= self.steps[self.index].duration;
            if self.index + 1 < self.steps.len() {
                self.index += 1;
            } else {
                self.finished = true;
                return InputState::IDLE;
            }
        }

        self.steps[self.index].into_input()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::TICK_DT;

    #[test]
    fn test_steps_play_in_order() {
        let mut player = ScriptedInputPlayer::from_steps(vec![
            ScriptedStep::new(0.1, 1.0, 0.0, false),
            ScriptedStep::new(0.1, 0.0, -1.0, true),
        ]);

        assert!(player.advance(0.05).right);
        let second = player.advance(0.1);
        assert!(second.up && second.sprint);
        assert_eq!(player.advance(0.1), InputState::IDLE);
        assert!(player.is_finished());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        fs::write(
            &path,
            r#"{"steps": [{"duration": 0.5, "move_x": -1.0}, {"duration": 0.5, "move_y": 1.0, "sprint": true}]}"#,
        )
        .unwrap();

        let mut player = ScriptedInputPlayer::from_path(&path).unwrap();
        assert!(player.advance(TICK_DT).left);
    }

    #[test]
    fn test_empty_script_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        fs::write(&path, r#"{"steps": []}"#).unwrap();

        assert!(ScriptedInputPlayer::from_path(&path).is_err());
    }

    #[test]
    fn test_default_route_eventually_finishes() {
        let mut player = ScriptedInputPlayer::default_route();
        for _ in 0..(60 * 9) {
            player.advance(TICK_DT);
        }
        assert!(player.is_finished());
    }
}
