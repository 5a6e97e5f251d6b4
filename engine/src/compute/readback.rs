//! GPU buffer readback
//!
//! One async path for reading a mappable buffer back to the host: request the
//! map, drive the device until the callback fires, copy the bytes out and
//! unmap. Blocking callers wrap it in `pollster::block_on`.

use futures::channel::oneshot;

use super::ComputeError;

/// Reads the first `size` bytes of `buffer`.
///
/// `buffer` must have been created with `MAP_READ` and `size` must be a
/// multiple of 4.
pub async fn map_read(device: &wgpu::Device, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u8>, ComputeError> {
    if size == 0 {
        return Ok(Vec::new());
    }

    let slice = buffer.slice(0..size);
    let (sender, receiver) = oneshot::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device.poll(wgpu::PollType::wait_indefinitely())?;

    receiver.await.map_err(|_| ComputeError::ReadbackCancelled)??;

    let bytes = slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(bytes)
}

/// Blocking form of [`map_read`].
pub fn map_read_blocking(device: &wgpu::Device, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u8>, ComputeError> {
    pollster::block_on(map_read(device, buffer, size))
}
