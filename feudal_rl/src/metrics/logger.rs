//! Per-iteration loss reports.
//!
//! Every update produces one [`TrainingSnapshot`]; loggers decide where it
//! goes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Report of one training iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSnapshot {
    /// Iteration (epoch) index, starting at 0.
    pub epoch: usize,
    /// Total environment steps.
    pub env_steps: usize,
    /// Number of finished episodes.
    pub episodes: usize,
    /// Average recent episode return.
    pub avg_reward: f32,
    /// Combined loss that was backpropagated.
    pub total_loss: f32,
    /// Worker policy loss.
    pub policy_loss: f32,
    /// Manager goal loss.
    pub manager_loss: f32,
    /// Worker value loss, scaled by its coefficient.
    pub value_worker_loss: f32,
    /// Manager value loss, scaled by its coefficient.
    pub value_manager_loss: f32,
    /// Global gradient norm before clipping.
    pub gradient_norm: f32,
    /// Steps in this iteration's rollout.
    pub rollout_len: usize,
    /// Learning rate used for the update.
    pub learning_rate: f64,
}

impl TrainingSnapshot {
    pub fn new(epoch: usize, env_steps: usize, episodes: usize, avg_reward: f32) -> Self {
        Self {
            epoch,
            env_steps,
            episodes,
            avg_reward,
            total_loss: 0.0,
            policy_loss: 0.0,
            manager_loss: 0.0,
            value_worker_loss: 0.0,
            value_manager_loss: 0.0,
            gradient_norm: 0.0,
            rollout_len: 0,
            learning_rate: 0.0,
        }
    }

    /// Set the loss breakdown. Value losses are expected already scaled.
    pub fn with_losses(
        mut self,
        total: f32,
        policy: f32,
        manager: f32,
        value_worker: f32,
        value_manager: f32,
    ) -> Self {
        self.total_loss = total;
        self.policy_loss = policy;
        self.manager_loss = manager;
        self.value_worker_loss = value_worker;
        self.value_manager_loss = value_manager;
        self
    }

    pub fn with_gradient_norm(mut self, norm: f32) -> Self {
        self.gradient_norm = norm;
        self
    }

    pub fn with_rollout_len(mut self, len: usize) -> Self {
        self.rollout_len = len;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }
}

/// Destination for training snapshots.
pub trait MetricsLogger {
    /// Log a training snapshot.
    fn log(&mut self, snapshot: &TrainingSnapshot) -> io::Result<()>;

    /// Flush any buffered output.
    fn flush(&mut self) -> io::Result<()>;
}

/// Console logger with aligned columns.
pub struct ConsoleLogger {
    log_interval: usize,
    last_logged: Option<usize>,
    start_time: Instant,
    show_header: bool,
}

impl ConsoleLogger {
    /// Create a console logger printing every `log_interval` epochs (at least 1).
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
            last_logged: None,
            start_time: Instant::now(),
            show_header: true,
        }
    }

    /// Whether `epoch` is due for printing.
    fn should_log(&self, epoch: usize) -> bool {
        match self.last_logged {
            None => true,
            Some(last) => epoch >= last + self.log_interval,
        }
    }

    fn print_header(&self) {
        println!(
            "{:>7} {:>9} {:>7} {:>9} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9} {:>5}",
            "Update", "EnvSteps", "Eps", "Reward", "Total", "Policy", "Manager", "ValueW", "ValueM",
            "GradNorm", "Len"
        );
        println!("{}", "-".repeat(105));
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) -> io::Result<()> {
        if !self.should_log(snapshot.epoch) {
            return Ok(());
        }

        if self.show_header {
            self.print_header();
            self.show_header = false;
        }

        println!(
            "{:>7} {:>9} {:>7} {:>9.3} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>9.3} {:>5}",
            snapshot.epoch,
            snapshot.env_steps,
            snapshot.episodes,
            snapshot.avg_reward,
            snapshot.total_loss,
            snapshot.policy_loss,
            snapshot.manager_loss,
            snapshot.value_worker_loss,
            snapshot.value_manager_loss,
            snapshot.gradient_norm,
            snapshot.rollout_len,
        );
        log::trace!(
            "update {} after {:.1}s",
            snapshot.epoch,
            self.start_time.elapsed().as_secs_f32()
        );

        self.last_logged = Some(snapshot.epoch);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// CSV file logger for analysis.
pub struct CSVLogger<W: Write = BufWriter<File>> {
    writer: W,
    start_time: Instant,
}

impl CSVLogger<BufWriter<File>> {
    /// Create (truncate) the CSV file at `path` and write the header.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::from_writer(BufWriter::new(file))
    }
}

impl<W: Write> CSVLogger<W> {
    /// Log to any writer; the header is written immediately.
    pub fn from_writer(mut writer: W) -> io::Result<Self> {
        writeln!(
            writer,
            "epoch,env_steps,episodes,avg_reward,total_loss,policy_loss,manager_loss,value_worker_loss,value_manager_loss,gradient_norm,rollout_len,learning_rate,elapsed_secs"
        )?;

        Ok(Self {
            writer,
            start_time: Instant::now(),
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsLogger for CSVLogger<W> {
    fn log(&mut self, snapshot: &TrainingSnapshot) -> io::Result<()> {
        let elapsed = self.start_time.elapsed().as_secs_f32();
        writeln!(
            self.writer,
            "{},{},{},{:.4},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{},{:.8},{:.2}",
            snapshot.epoch,
            snapshot.env_steps,
            snapshot.episodes,
            snapshot.avg_reward,
            snapshot.total_loss,
            snapshot.policy_loss,
            snapshot.manager_loss,
            snapshot.value_worker_loss,
            snapshot.value_manager_loss,
            snapshot.gradient_norm,
            snapshot.rollout_len,
            snapshot.learning_rate,
            elapsed
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Writes to several loggers in order; the first error stops the fan-out.
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Box<dyn MetricsLogger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<L: MetricsLogger + 'static>(mut self, logger: L) -> Self {
        self.loggers.push(Box::new(logger));
        self
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl MetricsLogger for MultiLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) -> io::Result<()> {
        for logger in &mut self.loggers {
            logger.log(snapshot)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        for logger in &mut self.loggers {
            logger.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(epoch: usize) -> TrainingSnapshot {
        TrainingSnapshot::new(epoch, epoch * 20, 3, 0.5)
            .with_losses(1.5, 0.25, -0.125, 0.75, 0.5)
            .with_gradient_norm(2.0)
            .with_rollout_len(20)
            .with_learning_rate(1e-3)
    }

    #[test]
    fn test_training_snapshot() {
        let snap = snapshot(4);
        assert_eq!(snap.epoch, 4);
        assert_eq!(snap.env_steps, 80);
        assert_eq!(snap.rollout_len, 20);
        assert!((snap.manager_loss + 0.125).abs() < 1e-6);
        assert!((snap.gradient_norm - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_console_logger_interval() {
        let mut logger = ConsoleLogger::new(10);
        assert!(logger.should_log(0));
        logger.log(&snapshot(0)).unwrap();

        assert!(!logger.should_log(5));
        assert!(logger.should_log(10));
    }

    #[test]
    fn test_csv_logger_rows() {
        let mut logger = CSVLogger::from_writer(Vec::new()).unwrap();
        logger.log(&snapshot(0)).unwrap();
        logger.log(&snapshot(1)).unwrap();
        logger.flush().unwrap();

        let text = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,env_steps,episodes"));
        assert!(lines[2].starts_with("1,20,3,0.5000,1.500000,0.250000,-0.125000"));
        assert_eq!(lines[1].split(',').count(), lines[0].split(',').count());
    }

    #[test]
    fn test_csv_logger_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        {
            let mut logger = CSVLogger::new(&path).unwrap();
            logger.log(&snapshot(7)).unwrap();
            logger.flush().unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("7,140,"));
    }

    #[test]
    fn test_multi_logger() {
        let mut multi = MultiLogger::new()
            .add(ConsoleLogger::new(1))
            .add(CSVLogger::from_writer(Vec::new()).unwrap());
        assert_eq!(multi.len(), 2);

        multi.log(&snapshot(0)).unwrap();
        multi.flush().unwrap();
    }
}
