use carcount::{
    BBox, BufferSink, BufferSource, Detection, MemoryTaskStore, RunConfig, ScriptedDetector, Task,
    TaskRunner,
};

/// Demo run: a single synthetic car drives down through the default counting
/// line at y=400 while the task record moves pending -> processing -> done.
fn main() {
    env_logger::init();

    let script: Vec<Vec<Detection>> = (0..60)
        .map(|step| {
            let cy = 250.0 + step as f64 * 5.0;
            vec![Detection {
                bbox: BBox::new(300.0, cy - 15.0, 340.0, cy + 15.0),
                score: 0.9,
                class: 2,
            }]
        })
        .collect();

    let mut task = Task::new("demo-task", "demo-user", "synthetic.mp4");
    let mut runner = TaskRunner::new(MemoryTaskStore::new());
    let mut sink = BufferSink::new();
    let mut detector = ScriptedDetector::new(script);
    let config = RunConfig::default();

    match runner.execute(
        &mut task,
        || Ok(BufferSource::blank(640, 480, 60, 30.0)),
        &mut sink,
        &mut detector,
        &config,
    ) {
        Ok(outcome) => println!(
            "counted {} vehicle(s) over {} frames; task status: {:?}",
            outcome.car_count, outcome.frames, task.status
        ),
        Err(e) => eprintln!("run failed: {e}; task status: {:?}", task.status),
    }
}
