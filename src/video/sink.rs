use crate::{error::Result, video::encoder::EncoderPipe, video::Frame};

/// Anything that consumes the ordered output frames of a run
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Called once after the last frame
    fn finish(&mut self) -> Result<()>;
}

impl FrameSink for EncoderPipe {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        EncoderPipe::write_frame(self, frame)
    }

    fn finish(&mut self) -> Result<()> {
        EncoderPipe::finish(self).map(|_| ())
    }
}

/// Keeps every frame in memory
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySink {
    pub frames: Vec<Frame>,
    pub finished: u32,
}

#[cfg(test)]
impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished += 1;
        Ok(())
    }
}
