use droidrec_common::protocol::{ActionLog, ClassifiedAction, Step};

pub fn describe_action(action: &ClassifiedAction) -> String {
    match action {
        ClassifiedAction::KeyInput { text, .. } => format!("Input: {}", text),
        ClassifiedAction::SpecialEvent { key } => key.clone(),
        ClassifiedAction::Tap { x, y } => format!("Click at ({}, {})", x, y),
        ClassifiedAction::LongPress { x, y, duration } => {
            format!("Press at ({}, {}) for {:.2}s", x, y, duration)
        }
        ClassifiedAction::Swipe {
            start_x,
            start_y,
            end_x,
            end_y,
            duration,
        } => format!(
            "Swipe from ({}, {}) to ({}, {}) in {:.2}s",
            start_x, start_y, end_x, end_y, duration
        ),
    }
}

pub fn describe_step(step: &Step) -> String {
    let action = match &step.action {
        Some(action) => describe_action(action),
        None => "Initial screen".to_string(),
    };
    let mut output = format!("Step {}: {}", step.step_id, action);
    if let Some(activity) = &step.activity_info {
        output.push_str(&format!(" [{}]", activity));
    }
    if let Some(bounds) = &step.operated_bounds {
        output.push_str(&format!(
            " on [{},{}][{},{}]",
            bounds.left, bounds.top, bounds.right, bounds.bottom
        ));
    }
    output
}

pub fn format_log(log: &ActionLog) -> String {
    let mut output = format!(
        "Target: {}\nSteps: {}",
        log.target.as_deref().unwrap_or("<none>"),
        log.action_count()
    );
    for step in &log.steps {
        output.push('\n');
        output.push_str(&describe_step(step));
    }
    output
}
