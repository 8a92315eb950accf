// src/wgpu_utils/uniform_buffer.rs
use std::marker::PhantomData;

fn content_name<Content>() -> &'static str {
    let type_name = std::any::type_name::<Content>();
    let pos = type_name.rfind(':').unwrap_or(0);
    if pos > 0 {
        &type_name[(pos + 1)..]
    } else {
        type_name
    }
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// An alignment of zero leaves the value untouched.
pub fn align_to(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

/// Single-element uniform buffer
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Create a new uniform buffer
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", content_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Create buffer with initial data
    pub fn new_with_data(device: &wgpu::Device, initial_content: &Content) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", content_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });

        buffer
            .slice(..)
            .get_mapped_range_mut()
            .clone_from_slice(bytemuck::bytes_of(initial_content));
        buffer.unmap();

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: bytemuck::bytes_of(initial_content).to_vec(),
        }
    }

    /// Update buffer content, skipping the write if nothing changed
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

/// Uniform buffer holding one `Content` per draw call.
///
/// Elements are laid out `stride` bytes apart, where the stride honours the
/// device's `min_uniform_buffer_offset_alignment`. Content is collected on the
/// CPU with [`push`](Self::push), written with a single
/// [`upload`](Self::upload), and each draw binds it at the offset `push`
/// returned.
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    staging: Vec<u8>,
    stride: u64,
    capacity: u64,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    pub fn new(device: &wgpu::Device, initial_capacity: u64) -> Self {
        let stride = align_to(
            std::mem::size_of::<Content>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let capacity = initial_capacity.max(1);

        DynamicUniformBuffer {
            buffer: Self::create_buffer(device, stride * capacity),
            content_type: PhantomData,
            staging: Vec::new(),
            stride,
            capacity,
        }
    }

    fn create_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("DynamicUniformBuffer: {}", content_name::<Content>())),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Size in bytes of one element as seen by the shader.
    pub fn element_size() -> u64 {
        std::mem::size_of::<Content>() as u64
    }

    /// Drops all pushed elements; the GPU buffer is kept.
    pub fn clear(&mut self) {
        self.staging.clear();
    }

    /// Appends one element and returns its dynamic offset.
    pub fn push(&mut self, content: &Content) -> u32 {
        let offset = self.staging.len();
        self.staging.resize(offset + self.stride as usize, 0);
        let bytes = bytemuck::bytes_of(content);
        self.staging[offset..offset + bytes.len()].copy_from_slice(bytes);
        offset as u32
    }

    pub fn len(&self) -> u64 {
        self.staging.len() as u64 / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    /// Writes all pushed elements to the GPU.
    ///
    /// Returns `true` if the buffer had to grow, in which case bind groups
    /// referencing it must be recreated.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let needed = self.len();
        let grown = needed > self.capacity;
        if grown {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create_buffer(device, self.stride * self.capacity);
            log::debug!(
                "Grew {} to {} elements",
                content_name::<Content>(),
                self.capacity
            );
        }
        if !self.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
        grown
    }

    /// Binding covering a single element; the draw supplies the offset.
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(Self::element_size()),
        })
    }
}
