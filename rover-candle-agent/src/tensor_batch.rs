use candle_core::{Device, IndexOp, Tensor};
use rover_core::replay_buffer::BatchBase;

/// A batch buffer backed by a [`Tensor`].
///
/// The internal tensor is allocated lazily on the first push, with the
/// shape `[capacity, data.dims()[1..]]` of the pushed data.
///
/// [`Tensor`]: https://docs.rs/candle-core/0.8.4/candle_core/struct.Tensor.html
#[derive(Clone, Debug)]
pub struct TensorBatch {
    buf: Option<Tensor>,
    capacity: usize,
}

impl TensorBatch {
    /// Creates a batch holding the given tensor.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.dims()[0] as _;
        Self {
            buf: Some(t),
            capacity,
        }
    }
}

impl BatchBase for TensorBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity,
        }
    }

    fn push(&mut self, index: usize, data: Self) {
        if data.buf.is_none() {
            return;
        }

        let batch_size = data.buf.as_ref().unwrap().dims()[0];
        if batch_size == 0 {
            return;
        }

        if self.buf.is_none() {
            let mut shape = data.buf.as_ref().unwrap().dims().to_vec();
            shape[0] = self.capacity;
            let dtype = data.buf.as_ref().unwrap().dtype();
            let device = Device::Cpu;
            self.buf = Some(Tensor::zeros(shape, dtype, &device).unwrap());
        }

        if index + batch_size > self.capacity {
            // wrap around at the end of the ring storage
            let batch_size = self.capacity - index;
            let data = &data.buf.unwrap();
            let data1 = data.i((..batch_size,)).unwrap();
            let data2 = data.i((batch_size..,)).unwrap();
            self.buf
                .as_mut()
                .unwrap()
                .slice_set(&data1, 0, index)
                .unwrap();
            self.buf.as_mut().unwrap().slice_set(&data2, 0, 0).unwrap();
        } else {
            self.buf
                .as_mut()
                .unwrap()
                .slice_set(&data.buf.unwrap(), 0, index)
                .unwrap();
        }
    }

    fn sample(&self, ixs: &Vec<usize>) -> Self {
        let capacity = ixs.len();
        let ixs = {
            let device = self.buf.as_ref().unwrap().device();
            let ixs = ixs.iter().map(|x| *x as u32).collect();
            Tensor::from_vec(ixs, &[capacity], device).unwrap()
        };
        let buf = Some(self.buf.as_ref().unwrap().index_select(&ixs, 0).unwrap());
        Self { buf, capacity }
    }
}

impl From<TensorBatch> for Tensor {
    fn from(b: TensorBatch) -> Self {
        b.buf.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::TensorBatch;
    use candle_core::{Device, Tensor};
    use rover_core::replay_buffer::BatchBase;

    fn row(v: f32) -> TensorBatch {
        TensorBatch::from_tensor(
            Tensor::from_slice(&[v, v + 0.5], &[1, 2], &Device::Cpu).unwrap(),
        )
    }

    #[test]
    fn push_and_sample() {
        let mut batch = TensorBatch::new(4);
        for i in 0..4 {
            batch.push(i, row(i as f32));
        }
        let sampled: Tensor = batch.sample(&vec![2, 0]).into();
        assert_eq!(
            sampled.to_vec2::<f32>().unwrap(),
            vec![vec![2., 2.5], vec![0., 0.5]]
        );
    }

    #[test]
    fn push_wraps_at_capacity() {
        let mut batch = TensorBatch::new(3);
        batch.push(
            2,
            TensorBatch::from_tensor(
                Tensor::from_slice(&[1f32, 1.5, 2., 2.5], &[2, 2], &Device::Cpu).unwrap(),
            ),
        );
        let sampled: Tensor = batch.sample(&vec![2, 0]).into();
        assert_eq!(
            sampled.to_vec2::<f32>().unwrap(),
            vec![vec![1., 1.5], vec![2., 2.5]]
        );
    }
}
